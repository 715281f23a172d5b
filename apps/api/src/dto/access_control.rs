use markops_application::{PermissionRecord, RoleRecord, UserRoleAssignment};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub level: i32,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/role-response.ts")]
pub struct RoleResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub level: i32,
}

impl From<&RoleRecord> for RoleResponse {
    fn from(role: &RoleRecord) -> Self {
        Self {
            id: role.id.to_string(),
            organization_id: role.organization_id.to_string(),
            name: role.name.clone(),
            level: role.level,
        }
    }
}

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub id: String,
    pub module: String,
    pub action: String,
    /// Canonical `MODULE:ACTION` form.
    pub key: String,
}

impl From<&PermissionRecord> for PermissionResponse {
    fn from(permission: &PermissionRecord) -> Self {
        Self {
            id: permission.id.to_string(),
            module: permission.module.clone(),
            action: permission.action.clone(),
            key: format!("{}:{}", permission.module, permission.action),
        }
    }
}

/// Incoming payload naming a permission as `MODULE:ACTION`.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-permission-request.ts"
)]
pub struct GrantPermissionRequest {
    pub permission: String,
}

/// Incoming payload for assigning a role to a user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-user-role-request.ts"
)]
pub struct AssignUserRoleRequest {
    pub role_id: String,
    pub team_id: Option<String>,
    /// RFC 3339 timestamp; defaults to now.
    pub valid_from: Option<String>,
    /// RFC 3339 timestamp; open-ended when absent.
    pub valid_to: Option<String>,
}

/// Incoming payload for removing a role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/unassign-user-role-request.ts"
)]
pub struct UnassignUserRoleRequest {
    pub role_id: String,
    pub team_id: Option<String>,
}

/// API representation of a user-role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-role-response.ts"
)]
pub struct UserRoleResponse {
    pub user_id: String,
    pub role_id: String,
    pub role_name: String,
    pub team_id: Option<String>,
    pub valid_from: String,
    pub valid_to: Option<String>,
}

impl From<&UserRoleAssignment> for UserRoleResponse {
    fn from(assignment: &UserRoleAssignment) -> Self {
        Self {
            user_id: assignment.user_id.to_string(),
            role_id: assignment.role_id.to_string(),
            role_name: assignment.role_name.clone(),
            team_id: assignment.team_id.map(|team_id| team_id.to_string()),
            valid_from: assignment.valid_from.to_rfc3339(),
            valid_to: assignment.valid_to.map(|valid_to| valid_to.to_rfc3339()),
        }
    }
}
