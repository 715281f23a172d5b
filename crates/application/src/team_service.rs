//! Team membership ports and application service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_core::{AppError, AppResult, NonEmptyString, OrganizationId};
use markops_domain::{TeamRole, UserId};
use uuid::Uuid;

/// Stored team row.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRecord {
    /// Team identifier.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Optional parent team; hierarchy only, never consulted by
    /// authorization.
    pub parent_team_id: Option<Uuid>,
    /// Team display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Soft-delete flag; deleted teams are invisible to reads.
    pub is_deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Stored membership row joined with user display data.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMemberRecord {
    /// Member user id.
    pub user_id: UserId,
    /// Member display name.
    pub display_name: String,
    /// Member email.
    pub email: String,
    /// Role within the team.
    pub role: TeamRole,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
}

/// A team together with its member roster.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDetail {
    /// The team row.
    pub team: TeamRecord,
    /// Current members.
    pub members: Vec<TeamMemberRecord>,
    /// Direct child teams.
    pub child_teams: Vec<TeamRecord>,
}

/// Repository port for team persistence.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Persists a new team.
    async fn insert(&self, team: &TeamRecord) -> AppResult<()>;

    /// Finds a team by id; soft-deleted teams are not returned.
    async fn find_by_id(&self, team_id: Uuid) -> AppResult<Option<TeamRecord>>;

    /// Lists teams for an organization.
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<TeamRecord>>;

    /// Lists direct, non-deleted children of a team.
    async fn list_children(&self, team_id: Uuid) -> AppResult<Vec<TeamRecord>>;

    /// Marks a team deleted.
    async fn soft_delete(&self, team_id: Uuid) -> AppResult<()>;

    /// Lists members of a team.
    async fn list_members(&self, team_id: Uuid) -> AppResult<Vec<TeamMemberRecord>>;

    /// Returns a user's membership role, if any.
    async fn find_membership(&self, team_id: Uuid, user_id: UserId)
    -> AppResult<Option<TeamRole>>;

    /// Inserts a membership row.
    async fn add_member(&self, team_id: Uuid, user_id: UserId, role: TeamRole) -> AppResult<()>;

    /// Updates a membership role.
    async fn update_member_role(
        &self,
        team_id: Uuid,
        user_id: UserId,
        role: TeamRole,
    ) -> AppResult<()>;

    /// Removes a membership row.
    async fn remove_member(&self, team_id: Uuid, user_id: UserId) -> AppResult<()>;
}

/// Application service for team management.
#[derive(Clone)]
pub struct TeamService {
    repository: Arc<dyn TeamRepository>,
}

impl TeamService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn TeamRepository>) -> Self {
        Self { repository }
    }

    /// Creates a team in an organization, optionally under a parent.
    pub async fn create_team(
        &self,
        organization_id: OrganizationId,
        name: &str,
        description: &str,
        parent_team_id: Option<Uuid>,
    ) -> AppResult<TeamRecord> {
        let name = NonEmptyString::new(name)
            .map_err(|_| AppError::Validation("team name must not be empty".to_owned()))?;

        if let Some(parent_id) = parent_team_id {
            let parent = self.require_team(parent_id).await?;
            if parent.organization_id != organization_id {
                return Err(AppError::Validation(
                    "parent team must belong to the same organization".to_owned(),
                ));
            }
        }

        let team = TeamRecord {
            id: Uuid::new_v4(),
            organization_id,
            parent_team_id,
            name: name.into(),
            description: description.trim().to_owned(),
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.repository.insert(&team).await?;
        Ok(team)
    }

    /// Lists teams for an organization.
    pub async fn list_teams(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<TeamRecord>> {
        self.repository.list_for_organization(organization_id).await
    }

    /// Returns a team with its member roster and direct children.
    pub async fn team_detail(&self, team_id: Uuid) -> AppResult<TeamDetail> {
        let team = self.require_team(team_id).await?;
        let members = self.repository.list_members(team_id).await?;
        let child_teams = self.repository.list_children(team_id).await?;
        Ok(TeamDetail {
            team,
            members,
            child_teams,
        })
    }

    /// Soft-deletes a team.
    pub async fn delete_team(&self, team_id: Uuid) -> AppResult<()> {
        self.require_team(team_id).await?;
        self.repository.soft_delete(team_id).await
    }

    /// Adds a user to a team. Defaults to the member role when none is given.
    pub async fn add_member(
        &self,
        team_id: Uuid,
        user_id: UserId,
        role: Option<TeamRole>,
    ) -> AppResult<TeamMemberRecord> {
        self.require_team(team_id).await?;

        if self
            .repository
            .find_membership(team_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "user is already a member of this team".to_owned(),
            ));
        }

        let role = role.unwrap_or(TeamRole::Member);
        self.repository.add_member(team_id, user_id, role).await?;

        let members = self.repository.list_members(team_id).await?;
        members
            .into_iter()
            .find(|member| member.user_id == user_id)
            .ok_or_else(|| AppError::Internal("membership row missing after insert".to_owned()))
    }

    /// Changes a member's role within a team.
    pub async fn change_member_role(
        &self,
        team_id: Uuid,
        user_id: UserId,
        role: TeamRole,
    ) -> AppResult<()> {
        self.require_team(team_id).await?;
        self.require_membership(team_id, user_id).await?;
        self.repository
            .update_member_role(team_id, user_id, role)
            .await
    }

    /// Removes a member from a team.
    pub async fn remove_member(&self, team_id: Uuid, user_id: UserId) -> AppResult<()> {
        self.require_team(team_id).await?;
        self.require_membership(team_id, user_id).await?;
        self.repository.remove_member(team_id, user_id).await
    }

    async fn require_team(&self, team_id: Uuid) -> AppResult<TeamRecord> {
        self.repository
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("team '{team_id}' was not found")))
    }

    async fn require_membership(&self, team_id: Uuid, user_id: UserId) -> AppResult<TeamRole> {
        self.repository
            .find_membership(team_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user is not a member of this team".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use markops_core::{AppError, AppResult, OrganizationId};
    use markops_domain::{TeamRole, UserId};
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::{TeamMemberRecord, TeamRecord, TeamRepository, TeamService};

    #[derive(Default)]
    struct FakeTeamRepository {
        teams: Mutex<HashMap<Uuid, TeamRecord>>,
        members: Mutex<Vec<(Uuid, TeamMemberRecord)>>,
    }

    #[async_trait]
    impl TeamRepository for FakeTeamRepository {
        async fn insert(&self, team: &TeamRecord) -> AppResult<()> {
            self.teams.lock().await.insert(team.id, team.clone());
            Ok(())
        }

        async fn find_by_id(&self, team_id: Uuid) -> AppResult<Option<TeamRecord>> {
            Ok(self
                .teams
                .lock()
                .await
                .get(&team_id)
                .filter(|team| !team.is_deleted)
                .cloned())
        }

        async fn list_for_organization(
            &self,
            organization_id: OrganizationId,
        ) -> AppResult<Vec<TeamRecord>> {
            Ok(self
                .teams
                .lock()
                .await
                .values()
                .filter(|team| team.organization_id == organization_id && !team.is_deleted)
                .cloned()
                .collect())
        }

        async fn list_children(&self, team_id: Uuid) -> AppResult<Vec<TeamRecord>> {
            Ok(self
                .teams
                .lock()
                .await
                .values()
                .filter(|team| team.parent_team_id == Some(team_id) && !team.is_deleted)
                .cloned()
                .collect())
        }

        async fn soft_delete(&self, team_id: Uuid) -> AppResult<()> {
            if let Some(team) = self.teams.lock().await.get_mut(&team_id) {
                team.is_deleted = true;
            }
            Ok(())
        }

        async fn list_members(&self, team_id: Uuid) -> AppResult<Vec<TeamMemberRecord>> {
            Ok(self
                .members
                .lock()
                .await
                .iter()
                .filter(|(id, _)| *id == team_id)
                .map(|(_, member)| member.clone())
                .collect())
        }

        async fn find_membership(
            &self,
            team_id: Uuid,
            user_id: UserId,
        ) -> AppResult<Option<TeamRole>> {
            Ok(self
                .members
                .lock()
                .await
                .iter()
                .find(|(id, member)| *id == team_id && member.user_id == user_id)
                .map(|(_, member)| member.role))
        }

        async fn add_member(
            &self,
            team_id: Uuid,
            user_id: UserId,
            role: TeamRole,
        ) -> AppResult<()> {
            self.members.lock().await.push((
                team_id,
                TeamMemberRecord {
                    user_id,
                    display_name: "member".to_owned(),
                    email: "member@example.com".to_owned(),
                    role,
                    joined_at: Utc::now(),
                },
            ));
            Ok(())
        }

        async fn update_member_role(
            &self,
            team_id: Uuid,
            user_id: UserId,
            role: TeamRole,
        ) -> AppResult<()> {
            for (id, member) in self.members.lock().await.iter_mut() {
                if *id == team_id && member.user_id == user_id {
                    member.role = role;
                }
            }
            Ok(())
        }

        async fn remove_member(&self, team_id: Uuid, user_id: UserId) -> AppResult<()> {
            self.members
                .lock()
                .await
                .retain(|(id, member)| !(*id == team_id && member.user_id == user_id));
            Ok(())
        }
    }

    fn service() -> TeamService {
        TeamService::new(Arc::new(FakeTeamRepository::default()))
    }

    #[tokio::test]
    async fn create_team_rejects_blank_name() {
        let result = service()
            .create_team(OrganizationId::new(), "   ", "", None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn added_member_defaults_to_member_role() {
        let service = service();
        let team = service
            .create_team(OrganizationId::new(), "Paid Social", "", None)
            .await;
        assert!(team.is_ok());
        let Ok(team) = team else { return };

        let member = service.add_member(team.id, UserId::new(), None).await;
        assert_eq!(member.map(|value| value.role).ok(), Some(TeamRole::Member));
    }

    #[tokio::test]
    async fn duplicate_membership_is_a_conflict() {
        let service = service();
        let team = service
            .create_team(OrganizationId::new(), "Paid Social", "", None)
            .await;
        assert!(team.is_ok());
        let Ok(team) = team else { return };

        let user_id = UserId::new();
        let first = service
            .add_member(team.id, user_id, Some(TeamRole::Leader))
            .await;
        assert!(first.is_ok());

        let second = service.add_member(team.id, user_id, None).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn change_role_requires_existing_membership() {
        let service = service();
        let team = service
            .create_team(OrganizationId::new(), "Paid Social", "", None)
            .await;
        assert!(team.is_ok());
        let Ok(team) = team else { return };

        let result = service
            .change_member_role(team.id, UserId::new(), TeamRole::Leader)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn detail_lists_direct_children() {
        let service = service();
        let organization_id = OrganizationId::new();
        let parent = service
            .create_team(organization_id, "Growth", "", None)
            .await;
        assert!(parent.is_ok());
        let Ok(parent) = parent else { return };

        let child = service
            .create_team(organization_id, "Paid Social", "", Some(parent.id))
            .await;
        assert!(child.is_ok());

        let detail = service.team_detail(parent.id).await;
        assert_eq!(
            detail
                .map(|detail| detail.child_teams.len())
                .ok(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn parent_must_share_the_organization() {
        let service = service();
        let parent = service
            .create_team(OrganizationId::new(), "Growth", "", None)
            .await;
        assert!(parent.is_ok());
        let Ok(parent) = parent else { return };

        let result = service
            .create_team(OrganizationId::new(), "Paid Social", "", Some(parent.id))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn soft_deleted_team_is_invisible() {
        let service = service();
        let team = service
            .create_team(OrganizationId::new(), "Paid Social", "", None)
            .await;
        assert!(team.is_ok());
        let Ok(team) = team else { return };

        assert!(service.delete_team(team.id).await.is_ok());
        let detail = service.team_detail(team.id).await;
        assert!(matches!(detail, Err(AppError::NotFound(_))));
    }
}
