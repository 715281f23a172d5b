//! PostgreSQL-backed repository for organization lookups.

use async_trait::async_trait;
use markops_application::{OrganizationRecord, OrganizationRepository};
use markops_core::{AppError, AppResult, OrganizationId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL implementation of the organization port.
#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    email_domain: String,
}

impl From<OrganizationRow> for OrganizationRecord {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            email_domain: row.email_domain,
        }
    }
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn find_by_id(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<OrganizationRecord>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, email_domain
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find organization: {error}")))?;

        Ok(row.map(OrganizationRecord::from))
    }

    async fn find_by_email_domain(&self, domain: &str) -> AppResult<Option<OrganizationRecord>> {
        // Domains are stored lower-cased; the comparison stays
        // case-insensitive against older rows.
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, email_domain
            FROM organizations
            WHERE lower(email_domain) = lower($1)
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find organization by domain: {error}"))
        })?;

        Ok(row.map(OrganizationRecord::from))
    }
}
