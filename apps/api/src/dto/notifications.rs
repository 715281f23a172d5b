use markops_application::{MockDispatchReport, NotificationSettingRecord};
use markops_domain::UserPreferences;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for updating delivery preferences; absent fields
/// stay unchanged. Quiet-hours bounds travel as `HH:MM` local time.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/preferences-request.ts"
)]
pub struct PreferencesRequest {
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub quiet_hours_start: Option<String>,
    pub quiet_hours_end: Option<String>,
    pub frequency: Option<String>,
}

/// API representation of delivery preferences.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/preferences-response.ts"
)]
pub struct PreferencesResponse {
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub quiet_hours_start: Option<String>,
    pub quiet_hours_end: Option<String>,
    pub frequency: Option<String>,
}

impl From<&UserPreferences> for PreferencesResponse {
    fn from(preferences: &UserPreferences) -> Self {
        Self {
            timezone: preferences.timezone.clone(),
            language: preferences.language.clone(),
            quiet_hours_start: preferences
                .quiet_hours_start
                .map(|time| time.format("%H:%M").to_string()),
            quiet_hours_end: preferences
                .quiet_hours_end
                .map(|time| time.format("%H:%M").to_string()),
            frequency: preferences.frequency.clone(),
        }
    }
}

/// Incoming payload for one trigger's channel toggles.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/notification-setting-request.ts"
)]
pub struct NotificationSettingRequest {
    pub trigger: String,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub slack_enabled: bool,
    pub slack_channel_id: Option<i64>,
}

/// API representation of one trigger's channel toggles.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/notification-setting-response.ts"
)]
pub struct NotificationSettingResponse {
    pub trigger: String,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub slack_enabled: bool,
    pub slack_channel_id: Option<i64>,
}

impl From<&NotificationSettingRecord> for NotificationSettingResponse {
    fn from(setting: &NotificationSettingRecord) -> Self {
        Self {
            trigger: setting.trigger.setting_key().to_owned(),
            in_app_enabled: setting.in_app_enabled,
            email_enabled: setting.email_enabled,
            slack_enabled: setting.slack_enabled,
            slack_channel_id: setting.slack_channel_id,
        }
    }
}

/// Incoming payload naming the trigger to simulate.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/test-dispatch-request.ts"
)]
pub struct TestDispatchRequest {
    pub trigger: String,
}

/// Result of a simulated dispatch.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dispatch-report-response.ts"
)]
pub struct DispatchReportResponse {
    pub quiet_hours_active: bool,
    pub channels_would_notify: Vec<String>,
    pub mock_logs: Vec<String>,
    pub summary: String,
}

impl From<&MockDispatchReport> for DispatchReportResponse {
    fn from(report: &MockDispatchReport) -> Self {
        Self {
            quiet_hours_active: report.quiet_hours_active,
            channels_would_notify: report.channels_would_notify.clone(),
            mock_logs: report.mock_logs.clone(),
            summary: report.summary.clone(),
        }
    }
}
