use markops_application::{CampaignMetricsSummary, StoredCampaignAssignment, StoredCampaignMetric};
use markops_domain::Campaign;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for campaign creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-campaign-request.ts"
)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub budget_cents: i64,
    /// RFC 3339 timestamp.
    pub start_date: String,
    /// RFC 3339 timestamp.
    pub end_date: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a campaign; absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-campaign-request.ts"
)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub budget_cents: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Incoming payload for a lifecycle transition.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-campaign-status-request.ts"
)]
pub struct UpdateCampaignStatusRequest {
    pub status: String,
}

/// API representation of a campaign.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/campaign-response.ts")]
pub struct CampaignResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub status: String,
    pub budget_cents: i64,
    pub spent_cents: i64,
    pub budget_utilization: f64,
    pub start_date: String,
    pub end_date: String,
    pub owner_id: String,
    pub is_active: bool,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Campaign> for CampaignResponse {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id.to_string(),
            name: campaign.name.clone(),
            description: campaign.description.clone(),
            campaign_type: campaign.campaign_type.as_str().to_owned(),
            status: campaign.status.as_str().to_owned(),
            budget_cents: campaign.budget_cents,
            spent_cents: campaign.spent_cents,
            budget_utilization: campaign.budget_utilization(),
            start_date: campaign.start_date.to_rfc3339(),
            end_date: campaign.end_date.to_rfc3339(),
            owner_id: campaign.owner_id.to_string(),
            is_active: campaign.is_active,
            tags: campaign.tags.clone(),
            created_at: campaign.created_at.to_rfc3339(),
            updated_at: campaign.updated_at.to_rfc3339(),
        }
    }
}

/// Incoming payload for attaching a collaborator.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-assignment-request.ts"
)]
pub struct AddAssignmentRequest {
    pub user_id: String,
    pub role: String,
}

/// API representation of a campaign assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-response.ts"
)]
pub struct AssignmentResponse {
    pub campaign_id: String,
    pub user_id: String,
    pub role: String,
    pub assigned_at: String,
}

impl From<&StoredCampaignAssignment> for AssignmentResponse {
    fn from(assignment: &StoredCampaignAssignment) -> Self {
        Self {
            campaign_id: assignment.campaign_id.to_string(),
            user_id: assignment.user_id.to_string(),
            role: assignment.role.as_str().to_owned(),
            assigned_at: assignment.assigned_at.to_rfc3339(),
        }
    }
}

/// Incoming payload for a daily metric sample.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/record-metric-request.ts"
)]
pub struct RecordMetricRequest {
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    pub impressions: u32,
    pub clicks: u32,
    pub conversions: u32,
}

/// API representation of a stored metric sample.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/metric-response.ts")]
pub struct MetricResponse {
    pub campaign_id: String,
    pub date: String,
    pub impressions: u32,
    pub clicks: u32,
    pub conversions: u32,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
}

impl From<&StoredCampaignMetric> for MetricResponse {
    fn from(metric: &StoredCampaignMetric) -> Self {
        Self {
            campaign_id: metric.campaign_id.to_string(),
            date: metric.date.to_string(),
            impressions: metric.sample.impressions,
            clicks: metric.sample.clicks,
            conversions: metric.sample.conversions,
            click_through_rate: metric.sample.click_through_rate,
            conversion_rate: metric.sample.conversion_rate,
        }
    }
}

/// Aggregated performance across a campaign's recorded days.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/metrics-summary-response.ts"
)]
pub struct MetricsSummaryResponse {
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub recorded_days: u32,
}

impl From<&CampaignMetricsSummary> for MetricsSummaryResponse {
    fn from(summary: &CampaignMetricsSummary) -> Self {
        Self {
            total_impressions: summary.total_impressions,
            total_clicks: summary.total_clicks,
            total_conversions: summary.total_conversions,
            click_through_rate: summary.click_through_rate,
            conversion_rate: summary.conversion_rate,
            recorded_days: summary.recorded_days,
        }
    }
}

/// Export payload bundling a campaign with its aggregated metrics.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/campaign-export-response.ts"
)]
pub struct CampaignExportResponse {
    pub campaign: CampaignResponse,
    pub metrics: MetricsSummaryResponse,
}
