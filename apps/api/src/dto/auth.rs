use markops_application::{SsoLoginOutcome, UserProfile};
use markops_core::UserIdentity;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for self-service registration.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/register-request.ts")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Incoming payload for password login.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/login-request.ts")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Simple message envelope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/generic-message-response.ts"
)]
pub struct GenericMessageResponse {
    pub message: String,
}

/// API representation of the session identity.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub organization_id: Option<String>,
    pub is_superuser: bool,
}

impl From<&UserIdentity> for UserIdentityResponse {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            user_id: identity.user_id().to_string(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(str::to_owned),
            organization_id: identity
                .organization_id()
                .map(|organization_id| organization_id.to_string()),
            is_superuser: identity.is_superuser(),
        }
    }
}

/// Profile view for the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/profile-response.ts")]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub is_verified: bool,
    pub organization: Option<String>,
    pub active_roles: Vec<String>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user.id.to_string(),
            email: profile.user.email,
            display_name: profile.user.display_name,
            is_verified: profile.user.is_verified,
            organization: profile.organization_name,
            active_roles: profile.active_roles,
        }
    }
}

/// Result of a completed SSO callback.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sso-callback-response.ts"
)]
pub struct SsoCallbackResponse {
    pub identity: UserIdentityResponse,
    pub is_new_user: bool,
    pub organization: String,
}

impl From<&SsoLoginOutcome> for SsoCallbackResponse {
    fn from(outcome: &SsoLoginOutcome) -> Self {
        Self {
            identity: UserIdentityResponse::from(&outcome.identity),
            is_new_user: outcome.is_new_user,
            organization: outcome.organization_name.clone(),
        }
    }
}
