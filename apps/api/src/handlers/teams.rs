use super::*;

use markops_core::OrganizationId;
use markops_domain::TeamRole;

fn parse_team_role(value: &str) -> Result<TeamRole, ApiError> {
    match value {
        "leader" => Ok(TeamRole::Leader),
        "member" => Ok(TeamRole::Member),
        _ => Err(AppError::Validation("'role' must be 'leader' or 'member'".to_owned()).into()),
    }
}

fn require_organization(user: &UserIdentity) -> Result<OrganizationId, ApiError> {
    user.organization_id()
        .ok_or_else(|| AppError::Forbidden("user belongs to no organization".to_owned()).into())
}

pub async fn create_team_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let organization_id = require_organization(&user)?;
    let parent_team_id = payload
        .parent_team_id
        .as_deref()
        .map(|value| parse_uuid(value, "parent_team_id"))
        .transpose()?;
    let team = state
        .team_service
        .create_team(
            organization_id,
            &payload.name,
            &payload.description,
            parent_team_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

pub async fn list_teams_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<TeamResponse>>> {
    let organization_id = require_organization(&user)?;
    let teams = state
        .team_service
        .list_teams(organization_id)
        .await?
        .iter()
        .map(TeamResponse::from)
        .collect();

    Ok(Json(teams))
}

pub async fn team_detail_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<TeamDetailResponse>> {
    let check = state
        .access_control_service
        .require_team_membership(&user, Some(team_id))
        .await?;
    ensure_team_access(check)?;

    let detail = state.team_service.team_detail(team_id).await?;
    Ok(Json(TeamDetailResponse::from(&detail)))
}

pub async fn delete_team_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let check = state
        .access_control_service
        .require_team_role(&user, Some(team_id), TeamRole::Leader)
        .await?;
    ensure_team_access(check)?;

    state.team_service.delete_team(team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_team_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<AddTeamMemberRequest>,
) -> ApiResult<(StatusCode, Json<TeamMemberResponse>)> {
    let check = state
        .access_control_service
        .require_team_role(&user, Some(team_id), TeamRole::Leader)
        .await?;
    ensure_team_access(check)?;

    let role = payload
        .role
        .as_deref()
        .map(parse_team_role)
        .transpose()?;
    let member = state
        .team_service
        .add_member(
            team_id,
            UserId::from_uuid(parse_uuid(&payload.user_id, "user_id")?),
            role,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TeamMemberResponse::from(&member))))
}

pub async fn change_team_member_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ChangeTeamMemberRoleRequest>,
) -> ApiResult<StatusCode> {
    let check = state
        .access_control_service
        .require_team_role(&user, Some(team_id), TeamRole::Leader)
        .await?;
    ensure_team_access(check)?;

    let role = parse_team_role(&payload.role)?;
    state
        .team_service
        .change_member_role(team_id, UserId::from_uuid(user_id), role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_team_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let check = state
        .access_control_service
        .require_team_role(&user, Some(team_id), TeamRole::Leader)
        .await?;
    ensure_team_access(check)?;

    state
        .team_service
        .remove_member(team_id, UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
