//! Campaign lifecycle ports and application service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use markops_core::{AppError, AppResult};
use markops_domain::{
    Campaign, CampaignAssignmentRole, CampaignMetricSample, CampaignStatus, CampaignType, UserId,
};
use uuid::Uuid;

/// Input payload for campaign creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCampaignInput {
    /// Campaign display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Channel classification.
    pub campaign_type: CampaignType,
    /// Total allocated budget in cents.
    pub budget_cents: i64,
    /// Scheduled start.
    pub start_date: DateTime<Utc>,
    /// Scheduled end.
    pub end_date: DateTime<Utc>,
    /// Primary owner.
    pub owner_id: UserId,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// Mutable fields accepted by campaign updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignUpdateInput {
    /// New name, when present.
    pub name: Option<String>,
    /// New description, when present.
    pub description: Option<String>,
    /// New budget in cents, when present.
    pub budget_cents: Option<i64>,
    /// New start, when present.
    pub start_date: Option<DateTime<Utc>>,
    /// New end, when present.
    pub end_date: Option<DateTime<Utc>>,
    /// New tags, when present.
    pub tags: Option<Vec<String>>,
}

/// Stored campaign team assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCampaignAssignment {
    /// Campaign the user is assigned to.
    pub campaign_id: Uuid,
    /// Assigned user.
    pub user_id: UserId,
    /// Role within the campaign.
    pub role: CampaignAssignmentRole,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}

/// Input payload for adding a campaign assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaignAssignment {
    /// User to assign.
    pub user_id: UserId,
    /// Role within the campaign.
    pub role: CampaignAssignmentRole,
}

/// Input payload for recording one day of metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMetricInput {
    /// Metric date; one row per (campaign, date).
    pub date: NaiveDate,
    /// Impressions served.
    pub impressions: u32,
    /// Clicks received.
    pub clicks: u32,
    /// Conversions attributed.
    pub conversions: u32,
}

/// Stored daily metric row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCampaignMetric {
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Metric date.
    pub date: NaiveDate,
    /// Derived sample.
    pub sample: CampaignMetricSample,
}

/// Aggregated metrics across a campaign's recorded days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CampaignMetricsSummary {
    /// Total impressions.
    pub total_impressions: u64,
    /// Total clicks.
    pub total_clicks: u64,
    /// Total conversions.
    pub total_conversions: u64,
    /// Overall clicks / impressions.
    pub click_through_rate: f64,
    /// Overall conversions / clicks.
    pub conversion_rate: f64,
    /// Number of recorded days.
    pub recorded_days: u32,
}

/// Repository port for campaign persistence.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Persists a new campaign.
    async fn insert(&self, campaign: &Campaign) -> AppResult<()>;

    /// Finds a campaign by id.
    async fn find_by_id(&self, campaign_id: Uuid) -> AppResult<Option<Campaign>>;

    /// Lists campaigns, newest first.
    async fn list(&self) -> AppResult<Vec<Campaign>>;

    /// Persists an updated campaign aggregate.
    async fn update(&self, campaign: &Campaign) -> AppResult<()>;

    /// Deletes a campaign.
    async fn delete(&self, campaign_id: Uuid) -> AppResult<()>;

    /// Lists assignments for a campaign.
    async fn list_assignments(&self, campaign_id: Uuid)
    -> AppResult<Vec<StoredCampaignAssignment>>;

    /// Adds an assignment; conflicts when the user is already assigned.
    async fn add_assignment(
        &self,
        campaign_id: Uuid,
        assignment: NewCampaignAssignment,
    ) -> AppResult<StoredCampaignAssignment>;

    /// Upserts the metric row for (campaign, date).
    async fn record_metric(&self, campaign_id: Uuid, input: RecordMetricInput) -> AppResult<()>;

    /// Lists metric rows for a campaign.
    async fn list_metrics(&self, campaign_id: Uuid) -> AppResult<Vec<StoredCampaignMetric>>;
}

/// Application service for campaign lifecycle management.
#[derive(Clone)]
pub struct CampaignService {
    repository: Arc<dyn CampaignRepository>,
}

impl CampaignService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn CampaignRepository>) -> Self {
        Self { repository }
    }

    /// Creates a campaign in draft state.
    pub async fn create_campaign(&self, input: CreateCampaignInput) -> AppResult<Campaign> {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            campaign_type: input.campaign_type,
            status: CampaignStatus::Draft,
            budget_cents: input.budget_cents,
            spent_cents: 0,
            start_date: input.start_date,
            end_date: input.end_date,
            owner_id: input.owner_id,
            is_active: true,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        campaign.validate()?;

        self.repository.insert(&campaign).await?;
        Ok(campaign)
    }

    /// Returns a campaign by id.
    pub async fn get_campaign(&self, campaign_id: Uuid) -> AppResult<Campaign> {
        self.repository
            .find_by_id(campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("campaign '{campaign_id}' was not found")))
    }

    /// Lists campaigns.
    pub async fn list_campaigns(&self) -> AppResult<Vec<Campaign>> {
        self.repository.list().await
    }

    /// Applies a partial update and revalidates the aggregate.
    pub async fn update_campaign(
        &self,
        campaign_id: Uuid,
        input: CampaignUpdateInput,
    ) -> AppResult<Campaign> {
        let mut campaign = self.get_campaign(campaign_id).await?;

        if let Some(name) = input.name {
            campaign.name = name;
        }
        if let Some(description) = input.description {
            campaign.description = description;
        }
        if let Some(budget_cents) = input.budget_cents {
            campaign.budget_cents = budget_cents;
        }
        if let Some(start_date) = input.start_date {
            campaign.start_date = start_date;
        }
        if let Some(end_date) = input.end_date {
            campaign.end_date = end_date;
        }
        if let Some(tags) = input.tags {
            campaign.tags = tags;
        }
        campaign.updated_at = Utc::now();
        campaign.validate()?;

        self.repository.update(&campaign).await?;
        Ok(campaign)
    }

    /// Deletes a campaign.
    pub async fn delete_campaign(&self, campaign_id: Uuid) -> AppResult<()> {
        // Ensure a NotFound surfaces before the delete becomes a no-op.
        self.get_campaign(campaign_id).await?;
        self.repository.delete(campaign_id).await
    }

    /// Transitions a campaign to a new status, enforcing the workflow
    /// transition table.
    pub async fn update_status(
        &self,
        campaign_id: Uuid,
        next: CampaignStatus,
    ) -> AppResult<Campaign> {
        let mut campaign = self.get_campaign(campaign_id).await?;

        if !campaign.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "cannot transition campaign from '{}' to '{}'",
                campaign.status.as_str(),
                next.as_str()
            )));
        }

        campaign.status = next;
        campaign.updated_at = Utc::now();
        self.repository.update(&campaign).await?;
        Ok(campaign)
    }

    /// Lists a campaign's assignments.
    pub async fn list_assignments(
        &self,
        campaign_id: Uuid,
    ) -> AppResult<Vec<StoredCampaignAssignment>> {
        self.get_campaign(campaign_id).await?;
        self.repository.list_assignments(campaign_id).await
    }

    /// Adds a user to a campaign.
    pub async fn add_assignment(
        &self,
        campaign_id: Uuid,
        assignment: NewCampaignAssignment,
    ) -> AppResult<StoredCampaignAssignment> {
        self.get_campaign(campaign_id).await?;
        self.repository.add_assignment(campaign_id, assignment).await
    }

    /// Records one day of metrics for a campaign.
    pub async fn record_metric(
        &self,
        campaign_id: Uuid,
        input: RecordMetricInput,
    ) -> AppResult<()> {
        self.get_campaign(campaign_id).await?;
        self.repository.record_metric(campaign_id, input).await
    }

    /// Lists the recorded daily metrics for a campaign.
    pub async fn list_metrics(
        &self,
        campaign_id: Uuid,
    ) -> AppResult<Vec<StoredCampaignMetric>> {
        self.get_campaign(campaign_id).await?;
        self.repository.list_metrics(campaign_id).await
    }

    /// Aggregates recorded metrics for a campaign.
    pub async fn metrics_summary(&self, campaign_id: Uuid) -> AppResult<CampaignMetricsSummary> {
        self.get_campaign(campaign_id).await?;
        let rows = self.repository.list_metrics(campaign_id).await?;

        let total_impressions: u64 = rows
            .iter()
            .map(|row| u64::from(row.sample.impressions))
            .sum();
        let total_clicks: u64 = rows.iter().map(|row| u64::from(row.sample.clicks)).sum();
        let total_conversions: u64 = rows
            .iter()
            .map(|row| u64::from(row.sample.conversions))
            .sum();

        let click_through_rate = if total_impressions > 0 {
            total_clicks as f64 / total_impressions as f64
        } else {
            0.0
        };
        let conversion_rate = if total_clicks > 0 {
            total_conversions as f64 / total_clicks as f64
        } else {
            0.0
        };

        Ok(CampaignMetricsSummary {
            total_impressions,
            total_clicks,
            total_conversions,
            click_through_rate,
            conversion_rate,
            recorded_days: rows.len() as u32,
        })
    }
}
