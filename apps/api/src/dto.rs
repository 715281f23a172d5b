//! Wire-level request and response types.
//!
//! Temporal fields travel as RFC 3339 strings (dates as `YYYY-MM-DD`)
//! and domain enums as their stable storage strings; handlers parse and
//! validate on the way in.

mod access_control;
mod auth;
mod campaigns;
mod notifications;
mod teams;

pub use access_control::{
    AssignUserRoleRequest, CreateRoleRequest, GrantPermissionRequest, PermissionResponse,
    RoleResponse, UnassignUserRoleRequest, UserRoleResponse,
};
pub use auth::{
    GenericMessageResponse, LoginRequest, ProfileResponse, RegisterRequest, SsoCallbackResponse,
    UserIdentityResponse,
};
pub use campaigns::{
    AddAssignmentRequest, AssignmentResponse, CampaignExportResponse, CampaignResponse,
    CreateCampaignRequest, MetricResponse, MetricsSummaryResponse, RecordMetricRequest,
    UpdateCampaignRequest, UpdateCampaignStatusRequest,
};
pub use notifications::{
    DispatchReportResponse, NotificationSettingRequest, NotificationSettingResponse,
    PreferencesRequest, PreferencesResponse, TestDispatchRequest,
};
pub use teams::{
    AddTeamMemberRequest, ChangeTeamMemberRoleRequest, CreateTeamRequest, TeamDetailResponse,
    TeamMemberResponse, TeamResponse,
};
