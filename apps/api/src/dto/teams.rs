use markops_application::{TeamDetail, TeamMemberRecord, TeamRecord};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for team creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-team-request.ts"
)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_team_id: Option<String>,
}

/// API representation of a team.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/team-response.ts")]
pub struct TeamResponse {
    pub id: String,
    pub organization_id: String,
    pub parent_team_id: Option<String>,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl From<&TeamRecord> for TeamResponse {
    fn from(team: &TeamRecord) -> Self {
        Self {
            id: team.id.to_string(),
            organization_id: team.organization_id.to_string(),
            parent_team_id: team.parent_team_id.map(|parent_id| parent_id.to_string()),
            name: team.name.clone(),
            description: team.description.clone(),
            created_at: team.created_at.to_rfc3339(),
        }
    }
}

/// API representation of a team member.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/team-member-response.ts"
)]
pub struct TeamMemberResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub joined_at: String,
}

impl From<&TeamMemberRecord> for TeamMemberResponse {
    fn from(member: &TeamMemberRecord) -> Self {
        Self {
            user_id: member.user_id.to_string(),
            display_name: member.display_name.clone(),
            email: member.email.clone(),
            role: member.role.display_name().to_owned(),
            joined_at: member.joined_at.to_rfc3339(),
        }
    }
}

/// A team together with its current members.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/team-detail-response.ts"
)]
pub struct TeamDetailResponse {
    pub team: TeamResponse,
    pub members: Vec<TeamMemberResponse>,
    pub child_teams: Vec<TeamResponse>,
}

impl From<&TeamDetail> for TeamDetailResponse {
    fn from(detail: &TeamDetail) -> Self {
        Self {
            team: TeamResponse::from(&detail.team),
            members: detail.members.iter().map(TeamMemberResponse::from).collect(),
            child_teams: detail.child_teams.iter().map(TeamResponse::from).collect(),
        }
    }
}

/// Incoming payload for adding a member; role is `leader` or `member`
/// and defaults to `member`.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-team-member-request.ts"
)]
pub struct AddTeamMemberRequest {
    pub user_id: String,
    pub role: Option<String>,
}

/// Incoming payload for changing a member's role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-team-member-role-request.ts"
)]
pub struct ChangeTeamMemberRoleRequest {
    pub role: String,
}
