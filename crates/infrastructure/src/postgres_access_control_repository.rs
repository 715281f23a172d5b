//! PostgreSQL-backed repository for authorization lookups.
//!
//! Every call reads the store directly; permission data is never cached,
//! so revocations and window expiries take effect on the next request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_application::AccessControlRepository;
use markops_core::{AppError, AppResult};
use markops_domain::{ActionKind, TeamRole, UserId};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the access-control port.
#[derive(Clone)]
pub struct PostgresAccessControlRepository {
    pool: PgPool,
}

impl PostgresAccessControlRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessControlRepository for PostgresAccessControlRepository {
    async fn list_active_role_ids(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT role_id
            FROM user_roles
            WHERE user_id = $1
                AND valid_from <= $2
                AND (valid_to IS NULL OR valid_to >= $2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load active roles: {error}")))
    }

    async fn any_role_grants(
        &self,
        role_ids: &[Uuid],
        module: &str,
        action: ActionKind,
    ) -> AppResult<bool> {
        if role_ids.is_empty() {
            return Ok(false);
        }

        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_permissions AS grants
                INNER JOIN permissions
                    ON permissions.id = grants.permission_id
                WHERE grants.role_id = ANY($1)
                    AND grants.is_deleted = FALSE
                    AND permissions.module = $2
                    AND permissions.action = $3
            )
            "#,
        )
        .bind(role_ids)
        .bind(module)
        .bind(action.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check role grants: {error}")))
    }

    async fn find_team_membership(
        &self,
        user_id: UserId,
        team_id: Uuid,
    ) -> AppResult<Option<TeamRole>> {
        let role_id = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT role_id
            FROM team_members
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load team membership: {error}")))?;

        role_id
            .map(|value| {
                TeamRole::from_id(value).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid team role id {value} for user '{user_id}': {error}"
                    ))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests;
