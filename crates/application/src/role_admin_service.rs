//! Role administration ports and application service.
//!
//! Owns the configuration side of the authorization model: roles, the
//! permission catalog, role-permission grants (revocation is a soft
//! delete), and user-role assignments with validity windows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_core::{AppError, AppResult, NonEmptyString, OrganizationId};
use markops_domain::{PermissionKey, UserId};
use uuid::Uuid;

/// Role row scoped to one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Stable role identifier.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Role name, unique within the organization.
    pub name: String,
    /// Display ordering; lower means higher privilege. Never consulted
    /// by authorization decisions.
    pub level: i32,
}

/// Catalog permission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Stable permission identifier.
    pub id: Uuid,
    /// Module axis.
    pub module: String,
    /// Action axis.
    pub action: String,
}

/// One user-role assignment with its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoleAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: Uuid,
    /// Role name, for display.
    pub role_name: String,
    /// Optional team scope.
    pub team_id: Option<Uuid>,
    /// Window start.
    pub valid_from: DateTime<Utc>,
    /// Window end; open-ended when absent.
    pub valid_to: Option<DateTime<Utc>>,
}

/// Input payload for assigning a role to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignUserRoleInput {
    /// User receiving the role.
    pub user_id: UserId,
    /// Role to assign.
    pub role_id: Uuid,
    /// Optional team scope; part of the uniqueness key.
    pub team_id: Option<Uuid>,
    /// Window start; defaults to now when absent.
    pub valid_from: Option<DateTime<Utc>>,
    /// Window end; open-ended when absent.
    pub valid_to: Option<DateTime<Utc>>,
}

/// Repository port for role administration.
#[async_trait]
pub trait RoleAdminRepository: Send + Sync {
    /// Lists roles in an organization ordered by level.
    async fn list_roles(&self, organization_id: OrganizationId) -> AppResult<Vec<RoleRecord>>;

    /// Finds a role by name within an organization.
    async fn find_role_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<RoleRecord>>;

    /// Creates a role; conflicts when the name already exists in the
    /// organization.
    async fn create_role(
        &self,
        organization_id: OrganizationId,
        name: &str,
        level: i32,
    ) -> AppResult<RoleRecord>;

    /// Lists the full permission catalog.
    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionRecord>>;

    /// Finds a catalog permission by (module, action).
    async fn find_permission(&self, key: &PermissionKey) -> AppResult<Option<PermissionRecord>>;

    /// Lists non-revoked grants attached to a role.
    async fn list_role_grants(&self, role_id: Uuid) -> AppResult<Vec<PermissionRecord>>;

    /// Attaches a permission to a role, reactivating a revoked grant if
    /// one exists.
    async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<()>;

    /// Revokes a grant by soft-deleting it. The next authorization check
    /// observes the revocation.
    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<()>;

    /// Lists a user's role assignments.
    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRoleAssignment>>;

    /// Creates a user-role assignment; conflicts on a duplicate
    /// (user, role, team) key. Overlapping validity windows for distinct
    /// keys are allowed.
    async fn assign_role(&self, input: AssignUserRoleInput) -> AppResult<()>;

    /// Removes a user-role assignment.
    async fn unassign_role(
        &self,
        user_id: UserId,
        role_id: Uuid,
        team_id: Option<Uuid>,
    ) -> AppResult<()>;

    /// Lists distinct permissions a user holds through assignments
    /// active at `at`.
    async fn list_effective_permissions(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionRecord>>;
}

/// Application service for role administration.
#[derive(Clone)]
pub struct RoleAdminService {
    repository: Arc<dyn RoleAdminRepository>,
}

impl RoleAdminService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleAdminRepository>) -> Self {
        Self { repository }
    }

    /// Lists roles in an organization.
    pub async fn list_roles(&self, organization_id: OrganizationId) -> AppResult<Vec<RoleRecord>> {
        self.repository.list_roles(organization_id).await
    }

    /// Creates a role after validating its name.
    pub async fn create_role(
        &self,
        organization_id: OrganizationId,
        name: &str,
        level: i32,
    ) -> AppResult<RoleRecord> {
        let name = NonEmptyString::new(name)?;
        if level < 0 {
            return Err(AppError::Validation(
                "role level must not be negative".to_owned(),
            ));
        }

        self.repository
            .create_role(organization_id, name.as_str().trim(), level)
            .await
    }

    /// Lists the permission catalog.
    pub async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionRecord>> {
        self.repository.list_permission_catalog().await
    }

    /// Lists non-revoked grants for a role.
    pub async fn list_role_grants(&self, role_id: Uuid) -> AppResult<Vec<PermissionRecord>> {
        self.repository.list_role_grants(role_id).await
    }

    /// Grants a catalog permission to a role.
    pub async fn grant_permission(&self, role_id: Uuid, key: &PermissionKey) -> AppResult<()> {
        let permission = self
            .repository
            .find_permission(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission '{key}' was not found")))?;

        self.repository.grant_permission(role_id, permission.id).await
    }

    /// Revokes a permission from a role.
    pub async fn revoke_permission(&self, role_id: Uuid, key: &PermissionKey) -> AppResult<()> {
        let permission = self
            .repository
            .find_permission(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission '{key}' was not found")))?;

        self.repository
            .revoke_permission(role_id, permission.id)
            .await
    }

    /// Lists a user's role assignments.
    pub async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRoleAssignment>> {
        self.repository.list_user_roles(user_id).await
    }

    /// Assigns a role to a user, defaulting the window start to now.
    pub async fn assign_role(&self, mut input: AssignUserRoleInput) -> AppResult<()> {
        if input.valid_from.is_none() {
            input.valid_from = Some(Utc::now());
        }

        if let (Some(valid_from), Some(valid_to)) = (input.valid_from, input.valid_to) {
            if valid_to < valid_from {
                return Err(AppError::Validation(
                    "valid_to must not precede valid_from".to_owned(),
                ));
            }
        }

        self.repository.assign_role(input).await
    }

    /// Removes a user-role assignment.
    pub async fn unassign_role(
        &self,
        user_id: UserId,
        role_id: Uuid,
        team_id: Option<Uuid>,
    ) -> AppResult<()> {
        self.repository.unassign_role(user_id, role_id, team_id).await
    }

    /// Lists the permissions a user currently holds.
    pub async fn list_effective_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<PermissionRecord>> {
        self.repository
            .list_effective_permissions(user_id, Utc::now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use markops_core::{AppError, AppResult, OrganizationId};
    use markops_domain::{PermissionKey, UserId};
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::{
        AssignUserRoleInput, PermissionRecord, RoleAdminRepository, RoleAdminService, RoleRecord,
        UserRoleAssignment,
    };

    #[derive(Default)]
    struct FakeRoleAdminRepository {
        assignments: Mutex<Vec<AssignUserRoleInput>>,
    }

    #[async_trait]
    impl RoleAdminRepository for FakeRoleAdminRepository {
        async fn list_roles(&self, _: OrganizationId) -> AppResult<Vec<RoleRecord>> {
            Ok(vec![])
        }

        async fn find_role_by_name(
            &self,
            _: OrganizationId,
            _: &str,
        ) -> AppResult<Option<RoleRecord>> {
            Ok(None)
        }

        async fn create_role(
            &self,
            organization_id: OrganizationId,
            name: &str,
            level: i32,
        ) -> AppResult<RoleRecord> {
            Ok(RoleRecord {
                id: Uuid::new_v4(),
                organization_id,
                name: name.to_owned(),
                level,
            })
        }

        async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionRecord>> {
            Ok(vec![])
        }

        async fn find_permission(
            &self,
            _: &PermissionKey,
        ) -> AppResult<Option<PermissionRecord>> {
            Ok(None)
        }

        async fn list_role_grants(&self, _: Uuid) -> AppResult<Vec<PermissionRecord>> {
            Ok(vec![])
        }

        async fn grant_permission(&self, _: Uuid, _: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn revoke_permission(&self, _: Uuid, _: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn list_user_roles(&self, _: UserId) -> AppResult<Vec<UserRoleAssignment>> {
            Ok(vec![])
        }

        async fn assign_role(&self, input: AssignUserRoleInput) -> AppResult<()> {
            self.assignments.lock().await.push(input);
            Ok(())
        }

        async fn unassign_role(&self, _: UserId, _: Uuid, _: Option<Uuid>) -> AppResult<()> {
            Ok(())
        }

        async fn list_effective_permissions(
            &self,
            _: UserId,
            _: DateTime<Utc>,
        ) -> AppResult<Vec<PermissionRecord>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn create_role_rejects_blank_name() {
        let service = RoleAdminService::new(Arc::new(FakeRoleAdminRepository::default()));
        let result = service.create_role(OrganizationId::new(), "   ", 10).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_role_rejects_negative_level() {
        let service = RoleAdminService::new(Arc::new(FakeRoleAdminRepository::default()));
        let result = service.create_role(OrganizationId::new(), "Buyer", -1).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn assign_role_defaults_window_start() {
        let repository = Arc::new(FakeRoleAdminRepository::default());
        let service = RoleAdminService::new(repository.clone());

        let result = service
            .assign_role(AssignUserRoleInput {
                user_id: UserId::new(),
                role_id: Uuid::new_v4(),
                team_id: None,
                valid_from: None,
                valid_to: None,
            })
            .await;
        assert!(result.is_ok());

        let assignments = repository.assignments.lock().await;
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].valid_from.is_some());
    }

    #[tokio::test]
    async fn assign_role_rejects_inverted_window() {
        let service = RoleAdminService::new(Arc::new(FakeRoleAdminRepository::default()));
        let now = Utc::now();

        let result = service
            .assign_role(AssignUserRoleInput {
                user_id: UserId::new(),
                role_id: Uuid::new_v4(),
                team_id: None,
                valid_from: Some(now),
                valid_to: Some(now - Duration::days(1)),
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn grant_unknown_permission_is_not_found() {
        let service = RoleAdminService::new(Arc::new(FakeRoleAdminRepository::default()));
        let key = PermissionKey::from_transport("ASSET:VIEW");
        assert!(key.is_ok());
        let Ok(key) = key else { return };

        let result = service.grant_permission(Uuid::new_v4(), &key).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
