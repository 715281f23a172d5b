//! PostgreSQL-backed repository for user accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_application::{UserRecord, UserRepository};
use markops_core::{AppError, AppResult, OrganizationId};
use markops_domain::UserId;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL implementation of the user port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    organization_id: Option<Uuid>,
    email: String,
    display_name: String,
    password_hash: Option<String>,
    is_active: bool,
    is_verified: bool,
    is_superuser: bool,
    verification_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            email: row.email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            is_active: row.is_active,
            is_verified: row.is_verified,
            is_superuser: row.is_superuser,
            verification_token: row.verification_token,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, organization_id, email, display_name, password_hash,
           is_active, is_verified, is_superuser, verification_token, created_at
    FROM users
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &UserRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, organization_id, email, display_name, password_hash,
                is_active, is_verified, is_superuser, verification_token, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.organization_id.map(|value| value.as_uuid()))
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.password_hash.as_deref())
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.is_superuser)
        .bind(user.verification_token.as_deref())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert user: {error}")))?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find user: {error}")))?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find user by email: {error}"))
            })?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_COLUMNS} WHERE verification_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find user by verification token: {error}"))
        })?;

        Ok(row.map(UserRecord::from))
    }

    async fn update(&self, user: &UserRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET organization_id = $2,
                email = $3,
                display_name = $4,
                password_hash = $5,
                is_active = $6,
                is_verified = $7,
                is_superuser = $8,
                verification_token = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.organization_id.map(|value| value.as_uuid()))
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.password_hash.as_deref())
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.is_superuser)
        .bind(user.verification_token.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update user: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "user '{}' was not found",
                user.id
            )));
        }

        Ok(())
    }

    async fn list_active_role_names(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT roles.name
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = $1
                AND user_roles.valid_from <= $2
                AND (user_roles.valid_to IS NULL OR user_roles.valid_to >= $2)
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list active roles: {error}")))
    }
}
