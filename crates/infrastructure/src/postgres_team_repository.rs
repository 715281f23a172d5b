//! PostgreSQL-backed repository for teams and memberships.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_application::{TeamMemberRecord, TeamRecord, TeamRepository};
use markops_core::{AppError, AppResult, OrganizationId};
use markops_domain::{TeamRole, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL implementation of the team port.
#[derive(Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TeamRow {
    id: Uuid,
    organization_id: Uuid,
    parent_team_id: Option<Uuid>,
    name: String,
    description: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl From<TeamRow> for TeamRecord {
    fn from(row: TeamRow) -> Self {
        Self {
            id: row.id,
            organization_id: OrganizationId::from_uuid(row.organization_id),
            parent_team_id: row.parent_team_id,
            name: row.name,
            description: row.description,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    user_id: Uuid,
    display_name: String,
    email: String,
    role_id: i32,
    joined_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_record(self) -> AppResult<TeamMemberRecord> {
        let role = TeamRole::from_id(self.role_id).map_err(|error| {
            AppError::Internal(format!(
                "invalid team role id {} for user '{}': {error}",
                self.role_id, self.user_id
            ))
        })?;

        Ok(TeamMemberRecord {
            user_id: UserId::from_uuid(self.user_id),
            display_name: self.display_name,
            email: self.email,
            role,
            joined_at: self.joined_at,
        })
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn insert(&self, team: &TeamRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO teams
                (id, organization_id, parent_team_id, name, description, is_deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(team.id)
        .bind(team.organization_id.as_uuid())
        .bind(team.parent_team_id)
        .bind(team.name.as_str())
        .bind(team.description.as_str())
        .bind(team.is_deleted)
        .bind(team.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(database_error)
                if database_error.code().as_deref() == Some("23505") =>
            {
                AppError::Conflict(format!(
                    "team '{}' already exists in this organization",
                    team.name
                ))
            }
            _ => AppError::Internal(format!("failed to insert team: {error}")),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, team_id: Uuid) -> AppResult<Option<TeamRecord>> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, organization_id, parent_team_id, name, description, is_deleted, created_at
            FROM teams
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find team: {error}")))?;

        Ok(row.map(TeamRecord::from))
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<TeamRecord>> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, organization_id, parent_team_id, name, description, is_deleted, created_at
            FROM teams
            WHERE organization_id = $1 AND is_deleted = FALSE
            ORDER BY name
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list teams: {error}")))?;

        Ok(rows.into_iter().map(TeamRecord::from).collect())
    }

    async fn list_children(&self, team_id: Uuid) -> AppResult<Vec<TeamRecord>> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, organization_id, parent_team_id, name, description, is_deleted, created_at
            FROM teams
            WHERE parent_team_id = $1 AND is_deleted = FALSE
            ORDER BY name
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list child teams: {error}")))?;

        Ok(rows.into_iter().map(TeamRecord::from).collect())
    }

    async fn soft_delete(&self, team_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE teams SET is_deleted = TRUE WHERE id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete team: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("team '{team_id}' was not found")));
        }

        Ok(())
    }

    async fn list_members(&self, team_id: Uuid) -> AppResult<Vec<TeamMemberRecord>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT
                team_members.user_id,
                users.display_name,
                users.email,
                team_members.role_id,
                team_members.joined_at
            FROM team_members
            INNER JOIN users
                ON users.id = team_members.user_id
            WHERE team_members.team_id = $1
            ORDER BY team_members.joined_at
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list team members: {error}")))?;

        rows.into_iter().map(MemberRow::into_record).collect()
    }

    async fn find_membership(
        &self,
        team_id: Uuid,
        user_id: UserId,
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
        .map_err(|error| AppError::Internal(format!("failed to find membership: {error}")))?;

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

    async fn add_member(&self, team_id: Uuid, user_id: UserId, role: TeamRole) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id, role_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(team_id)
        .bind(user_id.as_uuid())
        .bind(role.as_id())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to add team member: {error}")))?;

        Ok(())
    }

    async fn update_member_role(
        &self,
        team_id: Uuid,
        user_id: UserId,
        role: TeamRole,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE team_members
            SET role_id = $3
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id.as_uuid())
        .bind(role.as_id())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update member role: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "user is not a member of this team".to_owned(),
            ));
        }

        Ok(())
    }

    async fn remove_member(&self, team_id: Uuid, user_id: UserId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM team_members
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove member: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "user is not a member of this team".to_owned(),
            ));
        }

        Ok(())
    }
}
