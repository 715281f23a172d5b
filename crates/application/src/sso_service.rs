//! Mocked single-sign-on flow.
//!
//! The provider is simulated: the login endpoint redirects to a fixed
//! URL and the callback trusts whatever email it is given, so the flow
//! can be exercised end to end without a real identity provider.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use markops_core::{AppError, AppResult, OrganizationId, UserIdentity};
use markops_domain::{EmailAddress, UserId};
use uuid::Uuid;

use crate::role_admin_service::{AssignUserRoleInput, RoleAdminRepository};
use crate::user_service::{UserRecord, UserRepository};

/// Fixed redirect target of the simulated provider.
pub const SSO_REDIRECT_URL: &str = "https://mock-sso-provider.com/auth?state=mockstate";

/// Email used when the callback carries no email parameter.
const DEFAULT_CALLBACK_EMAIL: &str = "buyer@agencyX.com";

/// Role granted to accounts provisioned through the callback.
const DEFAULT_SSO_ROLE_NAME: &str = "Media Buyer";
const DEFAULT_SSO_ROLE_LEVEL: i32 = 30;

/// Stored organization row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationRecord {
    /// Organization identifier.
    pub id: OrganizationId,
    /// Display name.
    pub name: String,
    /// Lower-cased email domain used to match callback emails.
    pub email_domain: String,
}

/// Repository port for organization lookups.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Finds an organization by id.
    async fn find_by_id(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<OrganizationRecord>>;

    /// Finds an organization by lower-cased email domain.
    async fn find_by_email_domain(&self, domain: &str) -> AppResult<Option<OrganizationRecord>>;
}

/// Result of a completed callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SsoLoginOutcome {
    /// Session identity for the resolved account.
    pub identity: UserIdentity,
    /// Whether the callback provisioned a new account.
    pub is_new_user: bool,
    /// Name of the organization the email domain matched.
    pub organization_name: String,
}

/// Application service for the simulated SSO flow.
#[derive(Clone)]
pub struct SsoService {
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    roles: Arc<dyn RoleAdminRepository>,
}

impl SsoService {
    /// Creates a new service from its ports.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        roles: Arc<dyn RoleAdminRepository>,
    ) -> Self {
        Self {
            users,
            organizations,
            roles,
        }
    }

    /// Returns the provider redirect URL for the login endpoint.
    #[must_use]
    pub fn login_redirect_url(&self) -> &'static str {
        SSO_REDIRECT_URL
    }

    /// Completes the callback: resolves the organization by email
    /// domain, provisions or reactivates the account, and guarantees
    /// the default role.
    pub async fn complete_callback(&self, email: Option<&str>) -> AppResult<SsoLoginOutcome> {
        let email = EmailAddress::new(email.unwrap_or(DEFAULT_CALLBACK_EMAIL))?;

        let organization = self
            .organizations
            .find_by_email_domain(email.domain())
            .await?
            .ok_or_else(|| {
                AppError::Validation("No organization found for this email domain.".to_owned())
            })?;

        let existing = self.users.find_by_email(email.as_str()).await?;
        let is_new_user = existing.is_none();

        let user = match existing {
            Some(mut user) => {
                // Returning accounts get attached to the matched
                // organization and reactivated.
                if user.organization_id.is_none() {
                    user.organization_id = Some(organization.id);
                }
                user.is_verified = true;
                user.is_active = true;
                user.verification_token = None;
                self.users.update(&user).await?;
                user
            }
            None => {
                let user_id = UserId::new();
                let suffix = &user_id.as_uuid().simple().to_string()[..8];
                let user = UserRecord {
                    id: user_id,
                    organization_id: Some(organization.id),
                    email: email.as_str().to_owned(),
                    display_name: format!("user_{suffix}"),
                    password_hash: None,
                    is_active: true,
                    is_verified: true,
                    is_superuser: false,
                    verification_token: None,
                    created_at: Utc::now(),
                };
                self.users.insert(&user).await?;
                user
            }
        };

        let role_id = self.ensure_default_role(organization.id).await?;
        self.assign_default_role(user.id, role_id).await?;

        Ok(SsoLoginOutcome {
            identity: user.identity(),
            is_new_user,
            organization_name: organization.name,
        })
    }

    async fn ensure_default_role(&self, organization_id: OrganizationId) -> AppResult<Uuid> {
        if let Some(role) = self
            .roles
            .find_role_by_name(organization_id, DEFAULT_SSO_ROLE_NAME)
            .await?
        {
            return Ok(role.id);
        }

        let role = self
            .roles
            .create_role(organization_id, DEFAULT_SSO_ROLE_NAME, DEFAULT_SSO_ROLE_LEVEL)
            .await?;
        Ok(role.id)
    }

    async fn assign_default_role(&self, user_id: UserId, role_id: Uuid) -> AppResult<()> {
        let result = self
            .roles
            .assign_role(AssignUserRoleInput {
                user_id,
                role_id,
                team_id: None,
                valid_from: Some(Utc::now()),
                valid_to: None,
            })
            .await;

        match result {
            // Repeat logins already hold the assignment.
            Err(AppError::Conflict(_)) => Ok(()),
            other => other,
        }
    }
}
