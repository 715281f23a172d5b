//! PostgreSQL-backed repository for role administration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_application::{
    AssignUserRoleInput, PermissionRecord, RoleAdminRepository, RoleRecord, UserRoleAssignment,
};
use markops_core::{AppError, AppResult, OrganizationId};
use markops_domain::{PermissionKey, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(database_error) => {
            database_error.code().as_deref() == Some("23505")
        }
        _ => false,
    }
}

/// PostgreSQL implementation of the role-administration port.
#[derive(Clone)]
pub struct PostgresRoleAdminRepository {
    pool: PgPool,
}

impl PostgresRoleAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    level: i32,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            level: row.level,
        }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    module: String,
    action: String,
}

impl From<PermissionRow> for PermissionRecord {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: row.id,
            module: row.module,
            action: row.action,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: Uuid,
    role_id: Uuid,
    role_name: String,
    team_id: Option<Uuid>,
    valid_from: DateTime<Utc>,
    valid_to: Option<DateTime<Utc>>,
}

impl From<UserRoleRow> for UserRoleAssignment {
    fn from(row: UserRoleRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            role_id: row.role_id,
            role_name: row.role_name,
            team_id: row.team_id,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
        }
    }
}

#[async_trait]
impl RoleAdminRepository for PostgresRoleAdminRepository {
    async fn list_roles(&self, organization_id: OrganizationId) -> AppResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, organization_id, name, level
            FROM roles
            WHERE organization_id = $1
            ORDER BY level, name
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }

    async fn find_role_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, organization_id, name, level
            FROM roles
            WHERE organization_id = $1 AND name = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?;

        Ok(row.map(RoleRecord::from))
    }

    async fn create_role(
        &self,
        organization_id: OrganizationId,
        name: &str,
        level: i32,
    ) -> AppResult<RoleRecord> {
        let role_id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO roles (id, organization_id, name, level)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(role_id)
        .bind(organization_id.as_uuid())
        .bind(name)
        .bind(level)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(RoleRecord {
                id: role_id,
                organization_id,
                name: name.to_owned(),
                level,
            }),
            Err(error) if is_unique_violation(&error) => Err(AppError::Conflict(format!(
                "role '{name}' already exists in organization '{organization_id}'"
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to create role: {error}"
            ))),
        }
    }

    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, module, action
            FROM permissions
            ORDER BY module, action
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission catalog: {error}"))
        })?;

        Ok(rows.into_iter().map(PermissionRecord::from).collect())
    }

    async fn find_permission(&self, key: &PermissionKey) -> AppResult<Option<PermissionRecord>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, module, action
            FROM permissions
            WHERE module = $1 AND action = $2
            "#,
        )
        .bind(key.module.as_str())
        .bind(key.action.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission: {error}")))?;

        Ok(row.map(PermissionRecord::from))
    }

    async fn list_role_grants(&self, role_id: Uuid) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT permissions.id, permissions.module, permissions.action
            FROM role_permissions AS grants
            INNER JOIN permissions
                ON permissions.id = grants.permission_id
            WHERE grants.role_id = $1
                AND grants.is_deleted = FALSE
            ORDER BY permissions.module, permissions.action
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role grants: {error}")))?;

        Ok(rows.into_iter().map(PermissionRecord::from).collect())
    }

    async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<()> {
        // Re-granting a revoked permission reactivates the existing row.
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id, is_deleted)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (role_id, permission_id)
                DO UPDATE SET is_deleted = FALSE
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to grant permission: {error}")))?;

        Ok(())
    }

    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE role_permissions
            SET is_deleted = TRUE
            WHERE role_id = $1 AND permission_id = $2
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permission: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "no grant exists for this role and permission".to_owned(),
            ));
        }

        Ok(())
    }

    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT
                user_roles.user_id,
                user_roles.role_id,
                roles.name AS role_name,
                user_roles.team_id,
                user_roles.valid_from,
                user_roles.valid_to
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = $1
            ORDER BY user_roles.valid_from
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list user roles: {error}")))?;

        Ok(rows.into_iter().map(UserRoleAssignment::from).collect())
    }

    async fn assign_role(&self, input: AssignUserRoleInput) -> AppResult<()> {
        let valid_from = input.valid_from.unwrap_or_else(Utc::now);
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (id, user_id, role_id, team_id, valid_from, valid_to)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.user_id.as_uuid())
        .bind(input.role_id)
        .bind(input.team_id)
        .bind(valid_from)
        .bind(input.valid_to)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => Err(AppError::Conflict(format!(
                "user '{}' already holds this role for this team scope",
                input.user_id
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to assign role: {error}"
            ))),
        }
    }

    async fn unassign_role(
        &self,
        user_id: UserId,
        role_id: Uuid,
        team_id: Option<Uuid>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1
                AND role_id = $2
                AND team_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id)
        .bind(team_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to unassign role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "no matching role assignment exists".to_owned(),
            ));
        }

        Ok(())
    }

    async fn list_effective_permissions(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT permissions.id, permissions.module, permissions.action
            FROM user_roles
            INNER JOIN role_permissions AS grants
                ON grants.role_id = user_roles.role_id
                AND grants.is_deleted = FALSE
            INNER JOIN permissions
                ON permissions.id = grants.permission_id
            WHERE user_roles.user_id = $1
                AND user_roles.valid_from <= $2
                AND (user_roles.valid_to IS NULL OR user_roles.valid_to >= $2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list effective permissions: {error}"))
        })?;

        Ok(rows.into_iter().map(PermissionRecord::from).collect())
    }
}
