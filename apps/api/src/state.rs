use markops_application::{
    AccessControlService, CampaignService, NotificationService, RoleAdminService, SsoService,
    TeamService, UserService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_control_service: AccessControlService,
    pub campaign_service: CampaignService,
    pub notification_service: NotificationService,
    pub role_admin_service: RoleAdminService,
    pub sso_service: SsoService,
    pub team_service: TeamService,
    pub user_service: UserService,
    pub frontend_url: String,
}
