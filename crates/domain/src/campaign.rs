use std::str::FromStr;

use chrono::{DateTime, Utc};
use markops_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserId;

/// Workflow state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Initial state while the campaign is being planned.
    Draft,
    /// Campaign is currently running.
    Active,
    /// Campaign is temporarily stopped.
    Paused,
    /// Campaign finished successfully. Terminal.
    Completed,
    /// Campaign was cancelled before completion. Terminal.
    Cancelled,
}

impl CampaignStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether a transition to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Draft => matches!(next, Self::Active | Self::Cancelled),
            Self::Active => matches!(next, Self::Paused | Self::Completed | Self::Cancelled),
            Self::Paused => matches!(next, Self::Active | Self::Cancelled),
            Self::Completed | Self::Cancelled => false,
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::Validation(format!(
                "unknown campaign status '{value}'"
            ))),
        }
    }
}

/// Advertising channel classification for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    /// Banner and display placements.
    DigitalDisplay,
    /// Social network placements.
    SocialMedia,
    /// Search engine advertising.
    SearchEngine,
    /// Video placements.
    Video,
    /// Audio and podcast placements.
    Audio,
    /// Print media.
    Print,
    /// Out-of-home advertising.
    Outdoor,
    /// Influencer marketing.
    Influencer,
}

impl CampaignType {
    /// Returns a stable storage value for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigitalDisplay => "digital_display",
            Self::SocialMedia => "social_media",
            Self::SearchEngine => "search_engine",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Print => "print",
            Self::Outdoor => "outdoor",
            Self::Influencer => "influencer",
        }
    }
}

impl FromStr for CampaignType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "digital_display" => Ok(Self::DigitalDisplay),
            "social_media" => Ok(Self::SocialMedia),
            "search_engine" => Ok(Self::SearchEngine),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "print" => Ok(Self::Print),
            "outdoor" => Ok(Self::Outdoor),
            "influencer" => Ok(Self::Influencer),
            _ => Err(AppError::Validation(format!(
                "unknown campaign type '{value}'"
            ))),
        }
    }
}

/// Role of a user assigned to a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignAssignmentRole {
    /// Primary owner.
    Owner,
    /// Day-to-day manager.
    Manager,
    /// Read and reporting access.
    Analyst,
    /// Read-only access.
    Viewer,
}

impl CampaignAssignmentRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Analyst => "analyst",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for CampaignAssignmentRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            "analyst" => Ok(Self::Analyst),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::Validation(format!(
                "unknown campaign assignment role '{value}'"
            ))),
        }
    }
}

/// Core campaign aggregate.
///
/// Monetary amounts are held as integer cents to keep arithmetic exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Stable campaign identifier.
    pub id: Uuid,
    /// Campaign display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Channel classification.
    pub campaign_type: CampaignType,
    /// Workflow state.
    pub status: CampaignStatus,
    /// Total allocated budget in cents.
    pub budget_cents: i64,
    /// Amount spent so far in cents.
    pub spent_cents: i64,
    /// Scheduled start.
    pub start_date: DateTime<Utc>,
    /// Scheduled end.
    pub end_date: DateTime<Utc>,
    /// Primary owner.
    pub owner_id: UserId,
    /// Soft-activation flag.
    pub is_active: bool,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Validates the aggregate's cross-field invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "campaign name must not be empty".to_owned(),
            ));
        }

        if self.budget_cents <= 0 {
            return Err(AppError::Validation(
                "campaign budget must be positive".to_owned(),
            ));
        }

        if self.start_date >= self.end_date {
            return Err(AppError::Validation(
                "end date must be after start date".to_owned(),
            ));
        }

        if self.spent_cents > self.budget_cents {
            return Err(AppError::Validation(
                "spent amount cannot exceed budget".to_owned(),
            ));
        }

        Ok(())
    }

    /// Returns budget utilization as a percentage.
    #[must_use]
    pub fn budget_utilization(&self) -> f64 {
        if self.budget_cents == 0 {
            return 0.0;
        }
        (self.spent_cents as f64 / self.budget_cents as f64) * 100.0
    }

    /// Returns whether spend exceeds the allocated budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.spent_cents > self.budget_cents
    }

    /// Returns the scheduled duration in whole days.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Returns whether the campaign is running at `now`.
    #[must_use]
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active && self.start_date <= now && now <= self.end_date
    }
}

/// One day of recorded campaign performance.
///
/// Click-through and conversion rates are derived at record time from
/// the raw counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetricSample {
    /// Ad impressions served.
    pub impressions: u32,
    /// Clicks received.
    pub clicks: u32,
    /// Conversions attributed.
    pub conversions: u32,
    /// clicks / impressions, zero when no impressions.
    pub click_through_rate: f64,
    /// conversions / clicks, zero when no clicks.
    pub conversion_rate: f64,
}

impl CampaignMetricSample {
    /// Builds a sample from raw counters, deriving the rates.
    #[must_use]
    pub fn from_counts(impressions: u32, clicks: u32, conversions: u32) -> Self {
        let click_through_rate = if impressions > 0 {
            f64::from(clicks) / f64::from(impressions)
        } else {
            0.0
        };
        let conversion_rate = if clicks > 0 {
            f64::from(conversions) / f64::from(clicks)
        } else {
            0.0
        };

        Self {
            impressions,
            clicks,
            conversions,
            click_through_rate,
            conversion_rate,
        }
    }
}
