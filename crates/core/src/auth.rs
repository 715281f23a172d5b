use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::OrganizationId;

/// User information persisted in the authenticated session.
///
/// Identity is always passed explicitly into services; there is no
/// ambient request-scoped user state anywhere in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: Uuid,
    display_name: String,
    email: Option<String>,
    organization_id: Option<OrganizationId>,
    is_superuser: bool,
}

impl UserIdentity {
    /// Creates a user identity from authentication data.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        display_name: impl Into<String>,
        email: Option<String>,
        organization_id: Option<OrganizationId>,
        is_superuser: bool,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email,
            organization_id,
            is_superuser,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the account has one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the organization linked to the identity, if any.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    /// Returns whether the identity carries the superuser override.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }
}
