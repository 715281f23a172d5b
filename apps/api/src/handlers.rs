use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use markops_application::TeamAccessCheck;
use markops_core::{AppError, UserIdentity};
use markops_domain::UserId;

use crate::dto::{
    AddAssignmentRequest, AddTeamMemberRequest, AssignUserRoleRequest, AssignmentResponse,
    CampaignExportResponse, CampaignResponse, ChangeTeamMemberRoleRequest, CreateCampaignRequest,
    CreateRoleRequest, CreateTeamRequest, DispatchReportResponse, GrantPermissionRequest,
    MetricResponse, MetricsSummaryResponse, NotificationSettingRequest,
    NotificationSettingResponse, PermissionResponse, PreferencesRequest, PreferencesResponse,
    RecordMetricRequest, RoleResponse, TeamDetailResponse, TeamMemberResponse, TeamResponse,
    TestDispatchRequest, UnassignUserRoleRequest, UpdateCampaignRequest,
    UpdateCampaignStatusRequest, UserRoleResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

mod access_control;
mod campaigns;
mod health;
mod notifications;
mod teams;

pub use access_control::{
    assign_user_role_handler, create_role_handler, grant_permission_handler,
    list_permission_catalog_handler, list_role_grants_handler, list_roles_handler,
    list_user_permissions_handler, list_user_roles_handler, revoke_permission_handler,
    unassign_user_role_handler,
};
pub use campaigns::{
    add_assignment_handler, approve_campaign_handler, create_campaign_handler,
    delete_campaign_handler, export_campaign_handler, get_campaign_handler,
    list_assignments_handler, list_campaigns_handler, list_metrics_handler,
    metrics_summary_handler, record_metric_handler, update_campaign_handler,
    update_campaign_status_handler,
};
pub use health::health_handler;
pub use notifications::{
    get_preferences_handler, list_notification_settings_handler, test_dispatch_handler,
    update_notification_setting_handler, update_preferences_handler,
};
pub use teams::{
    add_team_member_handler, change_team_member_role_handler, create_team_handler,
    delete_team_handler, list_teams_handler, remove_team_member_handler, team_detail_handler,
};

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value)
        .map_err(|_| AppError::Validation(format!("'{field}' must be a UUID")).into())
}

fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| {
            AppError::Validation(format!("'{field}' must be an RFC 3339 timestamp")).into()
        })
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("'{field}' must be a YYYY-MM-DD date")).into())
}

fn parse_time(value: &str, field: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::Validation(format!("'{field}' must be an HH:MM time")).into())
}

/// Maps a team guard outcome to its fixed wire denial.
fn ensure_team_access(check: TeamAccessCheck) -> Result<(), ApiError> {
    match check.denial_message() {
        None => Ok(()),
        Some(message) => {
            let status = if check == TeamAccessCheck::MissingTeamId {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::FORBIDDEN
            };
            Err(ApiError::TeamGuard { status, message })
        }
    }
}

/// Role administration is reserved for superusers.
fn require_superuser(identity: &UserIdentity) -> Result<(), ApiError> {
    if identity.is_superuser() {
        Ok(())
    } else {
        Err(AppError::Forbidden("superuser access required".to_owned()).into())
    }
}
