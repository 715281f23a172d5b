use chrono::{Duration, Utc};
use markops_application::AccessControlRepository;
use markops_domain::{ActionKind, TeamRole, UserId};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresAccessControlRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for access control tests: {error}");
    }

    Some(pool)
}

struct Fixture {
    user_id: UserId,
    role_id: Uuid,
    team_id: Uuid,
}

async fn seed_fixture(pool: &PgPool) -> Fixture {
    let organization_id = Uuid::new_v4();
    let user_id = UserId::new();
    let role_id = Uuid::new_v4();
    let team_id = Uuid::new_v4();
    let permission_id = Uuid::new_v4();

    let organization = sqlx::query(
        "INSERT INTO organizations (id, name, email_domain) VALUES ($1, $2, $3)",
    )
    .bind(organization_id)
    .bind("Access Test Org")
    .bind(format!("{organization_id}.test"))
    .execute(pool)
    .await;
    assert!(organization.is_ok());

    let user = sqlx::query(
        "INSERT INTO users (id, organization_id, email, display_name) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id.as_uuid())
    .bind(organization_id)
    .bind(format!("{user_id}@{organization_id}.test"))
    .bind("Access Tester")
    .execute(pool)
    .await;
    assert!(user.is_ok());

    let role = sqlx::query(
        "INSERT INTO roles (id, organization_id, name, level) VALUES ($1, $2, $3, 10)",
    )
    .bind(role_id)
    .bind(organization_id)
    .bind(format!("role-{role_id}"))
    .execute(pool)
    .await;
    assert!(role.is_ok());

    let team = sqlx::query(
        "INSERT INTO teams (id, organization_id, name) VALUES ($1, $2, $3)",
    )
    .bind(team_id)
    .bind(organization_id)
    .bind("Access Test Team")
    .execute(pool)
    .await;
    assert!(team.is_ok());

    let permission = sqlx::query(
        r#"
        INSERT INTO permissions (id, module, action)
        VALUES ($1, 'CAMPAIGN', 'VIEW')
        ON CONFLICT (module, action) DO NOTHING
        "#,
    )
    .bind(permission_id)
    .execute(pool)
    .await;
    assert!(permission.is_ok());

    let grant = sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, permissions.id
        FROM permissions
        WHERE permissions.module = 'CAMPAIGN' AND permissions.action = 'VIEW'
        "#,
    )
    .bind(role_id)
    .execute(pool)
    .await;
    assert!(grant.is_ok());

    Fixture {
        user_id,
        role_id,
        team_id,
    }
}

#[tokio::test]
async fn expired_assignment_is_not_active() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAccessControlRepository::new(pool.clone());
    let fixture = seed_fixture(&pool).await;
    let now = Utc::now();

    let assignment = sqlx::query(
        r#"
        INSERT INTO user_roles (id, user_id, role_id, valid_from, valid_to)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(fixture.user_id.as_uuid())
    .bind(fixture.role_id)
    .bind(now - Duration::days(10))
    .bind(now - Duration::days(1))
    .execute(&pool)
    .await;
    assert!(assignment.is_ok());

    let active = repository.list_active_role_ids(fixture.user_id, now).await;
    assert_eq!(active.ok(), Some(vec![]));
}

#[tokio::test]
async fn open_ended_assignment_grants_permission() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAccessControlRepository::new(pool.clone());
    let fixture = seed_fixture(&pool).await;
    let now = Utc::now();

    let assignment = sqlx::query(
        r#"
        INSERT INTO user_roles (id, user_id, role_id, valid_from, valid_to)
        VALUES ($1, $2, $3, $4, NULL)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(fixture.user_id.as_uuid())
    .bind(fixture.role_id)
    .bind(now - Duration::days(1))
    .execute(&pool)
    .await;
    assert!(assignment.is_ok());

    let active = repository.list_active_role_ids(fixture.user_id, now).await;
    assert_eq!(active.as_ref().ok().map(Vec::len), Some(1));
    let Ok(role_ids) = active else { return };

    let granted = repository
        .any_role_grants(&role_ids, "CAMPAIGN", ActionKind::View)
        .await;
    assert_eq!(granted.ok(), Some(true));

    let not_granted = repository
        .any_role_grants(&role_ids, "CAMPAIGN", ActionKind::Delete)
        .await;
    assert_eq!(not_granted.ok(), Some(false));
}

#[tokio::test]
async fn revoked_grant_stops_matching() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAccessControlRepository::new(pool.clone());
    let fixture = seed_fixture(&pool).await;

    let revocation = sqlx::query(
        "UPDATE role_permissions SET is_deleted = TRUE WHERE role_id = $1",
    )
    .bind(fixture.role_id)
    .execute(&pool)
    .await;
    assert!(revocation.is_ok());

    let granted = repository
        .any_role_grants(&[fixture.role_id], "CAMPAIGN", ActionKind::View)
        .await;
    assert_eq!(granted.ok(), Some(false));
}

#[tokio::test]
async fn team_membership_role_is_decoded() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAccessControlRepository::new(pool.clone());
    let fixture = seed_fixture(&pool).await;

    let missing = repository
        .find_team_membership(fixture.user_id, fixture.team_id)
        .await;
    assert_eq!(missing.ok(), Some(None));

    let membership = sqlx::query(
        "INSERT INTO team_members (team_id, user_id, role_id) VALUES ($1, $2, $3)",
    )
    .bind(fixture.team_id)
    .bind(fixture.user_id.as_uuid())
    .bind(TeamRole::Leader.as_id())
    .execute(&pool)
    .await;
    assert!(membership.is_ok());

    let found = repository
        .find_team_membership(fixture.user_id, fixture.team_id)
        .await;
    assert_eq!(found.ok(), Some(Some(TeamRole::Leader)));
}
