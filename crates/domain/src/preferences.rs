//! Notification preference types and quiet-hours evaluation.

use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::security::{ActionKind, Module, PermissionKey};
use crate::user::UserId;

/// Per-user notification and locale preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Owning user.
    pub user_id: UserId,
    /// IANA timezone name, if configured.
    pub timezone: Option<String>,
    /// Preferred locale code.
    pub language: Option<String>,
    /// Start of the do-not-notify window, in local time.
    pub quiet_hours_start: Option<NaiveTime>,
    /// End of the do-not-notify window, in local time.
    pub quiet_hours_end: Option<NaiveTime>,
    /// Digest frequency keyword.
    pub frequency: Option<String>,
}

impl UserPreferences {
    /// Returns the quiet-hours window when both bounds are configured.
    #[must_use]
    pub fn quiet_hours(&self) -> Option<QuietHoursWindow> {
        match (self.quiet_hours_start, self.quiet_hours_end) {
            (Some(start), Some(end)) => Some(QuietHoursWindow { start, end }),
            _ => None,
        }
    }

    /// Returns whether `now` falls inside the user's quiet hours.
    ///
    /// The instant is converted to the user's timezone first; unknown or
    /// missing timezone names fall back to UTC.
    #[must_use]
    pub fn is_in_quiet_hours(&self, now: DateTime<Utc>) -> bool {
        let Some(window) = self.quiet_hours() else {
            return false;
        };

        let timezone = self
            .timezone
            .as_deref()
            .and_then(|name| Tz::from_str(name).ok())
            .unwrap_or(Tz::UTC);

        window.contains(now.with_timezone(&timezone).time())
    }
}

/// A daily do-not-notify window in the user's local time.
///
/// The window may span midnight (22:00 to 08:00); bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHoursWindow {
    /// Window start, local time.
    pub start: NaiveTime,
    /// Window end, local time.
    pub end: NaiveTime,
}

impl QuietHoursWindow {
    /// Returns whether the local time falls inside the window.
    #[must_use]
    pub fn contains(&self, local_time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= local_time && local_time <= self.end
        } else {
            local_time >= self.start || local_time <= self.end
        }
    }
}

/// Notification trigger keys recognized by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTrigger {
    /// A campaign run failed.
    CampaignFailure,
    /// A budget threshold was crossed.
    BudgetAlert,
    /// An asset needs attention.
    AssetAlert,
    /// A task is due.
    TaskDue,
}

impl NotificationTrigger {
    /// Returns the stable setting key for this trigger.
    #[must_use]
    pub fn setting_key(&self) -> &'static str {
        match self {
            Self::CampaignFailure => "campaign_failure",
            Self::BudgetAlert => "budget_alert",
            Self::AssetAlert => "asset_alert",
            Self::TaskDue => "task_due",
        }
    }

    /// Returns the module scope the trigger belongs to.
    #[must_use]
    pub fn module_scope(&self) -> &'static str {
        match self {
            Self::CampaignFailure => "campaigns",
            Self::BudgetAlert => "budget",
            Self::AssetAlert => "assets",
            Self::TaskDue => "general",
        }
    }
}

impl FromStr for NotificationTrigger {
    type Err = markops_core::AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "campaign_failure" => Ok(Self::CampaignFailure),
            "budget_alert" => Ok(Self::BudgetAlert),
            "asset_alert" => Ok(Self::AssetAlert),
            "task_due" => Ok(Self::TaskDue),
            _ => Err(markops_core::AppError::Validation(format!(
                "unknown notification trigger '{value}'"
            ))),
        }
    }
}

/// Maps a (setting key, module scope) pair to the permission a user must
/// hold before the matching notification setting may be enabled.
///
/// Returns `None` for settings without a permission requirement.
#[must_use]
pub fn notification_permission_requirement(
    setting_key: &str,
    module_scope: &str,
) -> Option<PermissionKey> {
    match (setting_key, module_scope) {
        ("campaign_failure", "campaigns") => {
            Some(PermissionKey::new(Module::Campaign, ActionKind::View))
        }
        ("budget_alert", "budget") => Some(PermissionKey::new(Module::Budget, ActionKind::View)),
        ("asset_alert", "assets") => Some(PermissionKey::new(Module::Asset, ActionKind::View)),
        _ => None,
    }
}
