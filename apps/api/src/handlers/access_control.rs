use super::*;

use markops_application::AssignUserRoleInput;
use markops_core::OrganizationId;
use markops_domain::PermissionKey;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    require_superuser(&user)?;
    let organization_id = caller_organization(&user)?;

    let roles = state
        .role_admin_service
        .list_roles(organization_id)
        .await?
        .iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    require_superuser(&user)?;
    let organization_id = caller_organization(&user)?;

    let role = state
        .role_admin_service
        .create_role(organization_id, &payload.name, payload.level)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(&role))))
}

pub async fn list_permission_catalog_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    require_superuser(&user)?;

    let permissions = state
        .role_admin_service
        .list_permission_catalog()
        .await?
        .iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn list_role_grants_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    require_superuser(&user)?;

    let permissions = state
        .role_admin_service
        .list_role_grants(role_id)
        .await?
        .iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<GrantPermissionRequest>,
) -> ApiResult<StatusCode> {
    require_superuser(&user)?;

    let key = PermissionKey::from_transport(&payload.permission)?;
    state
        .role_admin_service
        .grant_permission(role_id, &key)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<GrantPermissionRequest>,
) -> ApiResult<StatusCode> {
    require_superuser(&user)?;

    let key = PermissionKey::from_transport(&payload.permission)?;
    state
        .role_admin_service
        .revoke_permission(role_id, &key)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserRoleResponse>>> {
    require_superuser(&user)?;

    let assignments = state
        .role_admin_service
        .list_user_roles(UserId::from_uuid(user_id))
        .await?
        .iter()
        .map(UserRoleResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignUserRoleRequest>,
) -> ApiResult<StatusCode> {
    require_superuser(&user)?;

    let valid_from = payload
        .valid_from
        .as_deref()
        .map(|value| parse_timestamp(value, "valid_from"))
        .transpose()?;
    let valid_to = payload
        .valid_to
        .as_deref()
        .map(|value| parse_timestamp(value, "valid_to"))
        .transpose()?;
    let team_id = payload
        .team_id
        .as_deref()
        .map(|value| parse_uuid(value, "team_id"))
        .transpose()?;

    state
        .role_admin_service
        .assign_role(AssignUserRoleInput {
            user_id: UserId::from_uuid(user_id),
            role_id: parse_uuid(&payload.role_id, "role_id")?,
            team_id,
            valid_from,
            valid_to,
        })
        .await?;

    Ok(StatusCode::CREATED)
}

pub async fn unassign_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UnassignUserRoleRequest>,
) -> ApiResult<StatusCode> {
    require_superuser(&user)?;

    let team_id = payload
        .team_id
        .as_deref()
        .map(|value| parse_uuid(value, "team_id"))
        .transpose()?;

    state
        .role_admin_service
        .unassign_role(
            UserId::from_uuid(user_id),
            parse_uuid(&payload.role_id, "role_id")?,
            team_id,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    require_superuser(&user)?;

    let permissions = state
        .role_admin_service
        .list_effective_permissions(UserId::from_uuid(user_id))
        .await?
        .iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

fn caller_organization(user: &UserIdentity) -> Result<OrganizationId, ApiError> {
    user.organization_id()
        .ok_or_else(|| AppError::Forbidden("user belongs to no organization".to_owned()).into())
}
