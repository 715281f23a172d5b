//! PostgreSQL-backed repository for campaigns, assignments, and daily
//! metrics.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use markops_application::{
    CampaignRepository, NewCampaignAssignment, RecordMetricInput, StoredCampaignAssignment,
    StoredCampaignMetric,
};
use markops_core::{AppError, AppResult};
use markops_domain::{
    Campaign, CampaignAssignmentRole, CampaignMetricSample, CampaignStatus, CampaignType, UserId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL implementation of the campaign port.
#[derive(Clone)]
pub struct PostgresCampaignRepository {
    pool: PgPool,
}

impl PostgresCampaignRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CampaignRow {
    id: Uuid,
    name: String,
    description: String,
    campaign_type: String,
    status: String,
    budget_cents: i64,
    spent_cents: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    owner_id: Uuid,
    is_active: bool,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CampaignRow {
    fn into_campaign(self) -> AppResult<Campaign> {
        let campaign_type =
            CampaignType::from_str(self.campaign_type.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid campaign type '{}' for campaign '{}': {error}",
                    self.campaign_type, self.id
                ))
            })?;
        let status = CampaignStatus::from_str(self.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid campaign status '{}' for campaign '{}': {error}",
                self.status, self.id
            ))
        })?;

        Ok(Campaign {
            id: self.id,
            name: self.name,
            description: self.description,
            campaign_type,
            status,
            budget_cents: self.budget_cents,
            spent_cents: self.spent_cents,
            start_date: self.start_date,
            end_date: self.end_date,
            owner_id: UserId::from_uuid(self.owner_id),
            is_active: self.is_active,
            tags: self.tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    campaign_id: Uuid,
    user_id: Uuid,
    role: String,
    assigned_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn into_record(self) -> AppResult<StoredCampaignAssignment> {
        let role = CampaignAssignmentRole::from_str(self.role.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid assignment role '{}' on campaign '{}': {error}",
                self.role, self.campaign_id
            ))
        })?;

        Ok(StoredCampaignAssignment {
            campaign_id: self.campaign_id,
            user_id: UserId::from_uuid(self.user_id),
            role,
            assigned_at: self.assigned_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MetricRow {
    campaign_id: Uuid,
    metric_date: NaiveDate,
    impressions: i32,
    clicks: i32,
    conversions: i32,
}

const SELECT_CAMPAIGN: &str = r#"
    SELECT id, name, description, campaign_type, status, budget_cents, spent_cents,
           start_date, end_date, owner_id, is_active, tags, created_at, updated_at
    FROM campaigns
"#;

#[async_trait]
impl CampaignRepository for PostgresCampaignRepository {
    async fn insert(&self, campaign: &Campaign) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, name, description, campaign_type, status, budget_cents, spent_cents,
                start_date, end_date, owner_id, is_active, tags, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(campaign.id)
        .bind(campaign.name.as_str())
        .bind(campaign.description.as_str())
        .bind(campaign.campaign_type.as_str())
        .bind(campaign.status.as_str())
        .bind(campaign.budget_cents)
        .bind(campaign.spent_cents)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(campaign.owner_id.as_uuid())
        .bind(campaign.is_active)
        .bind(&campaign.tags)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert campaign: {error}")))?;

        Ok(())
    }

    async fn find_by_id(&self, campaign_id: Uuid) -> AppResult<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!("{SELECT_CAMPAIGN} WHERE id = $1"))
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find campaign: {error}")))?;

        row.map(CampaignRow::into_campaign).transpose()
    }

    async fn list(&self) -> AppResult<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, CampaignRow>(&format!(
            "{SELECT_CAMPAIGN} ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list campaigns: {error}")))?;

        rows.into_iter().map(CampaignRow::into_campaign).collect()
    }

    async fn update(&self, campaign: &Campaign) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET name = $2,
                description = $3,
                campaign_type = $4,
                status = $5,
                budget_cents = $6,
                spent_cents = $7,
                start_date = $8,
                end_date = $9,
                is_active = $10,
                tags = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(campaign.id)
        .bind(campaign.name.as_str())
        .bind(campaign.description.as_str())
        .bind(campaign.campaign_type.as_str())
        .bind(campaign.status.as_str())
        .bind(campaign.budget_cents)
        .bind(campaign.spent_cents)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(campaign.is_active)
        .bind(&campaign.tags)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update campaign: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "campaign '{}' was not found",
                campaign.id
            )));
        }

        Ok(())
    }

    async fn delete(&self, campaign_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete campaign: {error}")))?;

        Ok(())
    }

    async fn list_assignments(
        &self,
        campaign_id: Uuid,
    ) -> AppResult<Vec<StoredCampaignAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT campaign_id, user_id, role, assigned_at
            FROM campaign_assignments
            WHERE campaign_id = $1
            ORDER BY assigned_at
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        rows.into_iter().map(AssignmentRow::into_record).collect()
    }

    async fn add_assignment(
        &self,
        campaign_id: Uuid,
        assignment: NewCampaignAssignment,
    ) -> AppResult<StoredCampaignAssignment> {
        let assigned_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO campaign_assignments (campaign_id, user_id, role, assigned_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(campaign_id)
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role.as_str())
        .bind(assigned_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(StoredCampaignAssignment {
                campaign_id,
                user_id: assignment.user_id,
                role: assignment.role,
                assigned_at,
            }),
            Err(sqlx::Error::Database(database_error))
                if database_error.code().as_deref() == Some("23505") =>
            {
                Err(AppError::Conflict(format!(
                    "user '{}' is already assigned to this campaign",
                    assignment.user_id
                )))
            }
            Err(error) => Err(AppError::Internal(format!(
                "failed to add assignment: {error}"
            ))),
        }
    }

    async fn record_metric(&self, campaign_id: Uuid, input: RecordMetricInput) -> AppResult<()> {
        let sample =
            CampaignMetricSample::from_counts(input.impressions, input.clicks, input.conversions);

        sqlx::query(
            r#"
            INSERT INTO campaign_metrics (
                campaign_id, metric_date, impressions, clicks, conversions,
                click_through_rate, conversion_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (campaign_id, metric_date) DO UPDATE SET
                impressions = EXCLUDED.impressions,
                clicks = EXCLUDED.clicks,
                conversions = EXCLUDED.conversions,
                click_through_rate = EXCLUDED.click_through_rate,
                conversion_rate = EXCLUDED.conversion_rate
            "#,
        )
        .bind(campaign_id)
        .bind(input.date)
        .bind(i32::try_from(input.impressions).unwrap_or(i32::MAX))
        .bind(i32::try_from(input.clicks).unwrap_or(i32::MAX))
        .bind(i32::try_from(input.conversions).unwrap_or(i32::MAX))
        .bind(sample.click_through_rate)
        .bind(sample.conversion_rate)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record metric: {error}")))?;

        Ok(())
    }

    async fn list_metrics(&self, campaign_id: Uuid) -> AppResult<Vec<StoredCampaignMetric>> {
        let rows = sqlx::query_as::<_, MetricRow>(
            r#"
            SELECT campaign_id, metric_date, impressions, clicks, conversions
            FROM campaign_metrics
            WHERE campaign_id = $1
            ORDER BY metric_date
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list metrics: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| StoredCampaignMetric {
                campaign_id: row.campaign_id,
                date: row.metric_date,
                sample: CampaignMetricSample::from_counts(
                    u32::try_from(row.impressions).unwrap_or(0),
                    u32::try_from(row.clicks).unwrap_or(0),
                    u32::try_from(row.conversions).unwrap_or(0),
                ),
            })
            .collect())
    }
}
