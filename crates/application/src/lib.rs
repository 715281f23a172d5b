//! Application services and repository ports.

#![forbid(unsafe_code)]

mod access_control_service;
mod campaign_service;
mod notification_service;
mod role_admin_service;
mod sso_service;
mod team_service;
mod user_service;

pub use access_control_service::{
    AccessControlRepository, AccessControlService, AccessDecision, TeamAccessCheck,
};
pub use campaign_service::{
    CampaignMetricsSummary, CampaignRepository, CampaignService, CampaignUpdateInput,
    CreateCampaignInput, NewCampaignAssignment, RecordMetricInput, StoredCampaignAssignment,
    StoredCampaignMetric,
};
pub use notification_service::{
    MockDispatchReport, NotificationService, NotificationSettingRecord, PreferencesInput,
    PreferencesRepository, SlackIntegrationRecord,
};
pub use role_admin_service::{
    AssignUserRoleInput, PermissionRecord, RoleAdminRepository, RoleAdminService, RoleRecord,
    UserRoleAssignment,
};
pub use sso_service::{
    OrganizationRecord, OrganizationRepository, SSO_REDIRECT_URL, SsoLoginOutcome, SsoService,
};
pub use team_service::{TeamDetail, TeamMemberRecord, TeamRecord, TeamRepository, TeamService};
pub use user_service::{
    EmailService, PasswordHasher, RegisterUserInput, UserProfile, UserRecord, UserRepository,
    UserService, VerificationOutcome,
};
