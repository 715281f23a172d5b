//! Authorization resolution engine.
//!
//! Two primitives live here: the request-level permission check driven
//! by the lexical classifier, and the narrower team-scoped guard used by
//! team-mutation endpoints. Both re-read the store on every call; there
//! is no permission cache, so a revoked grant is visible to the next
//! request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_core::{AppResult, UserIdentity};
use markops_domain::{ActionKind, TeamRole, UserId, classify_request};
use uuid::Uuid;

/// Repository port for authorization lookups.
#[async_trait]
pub trait AccessControlRepository: Send + Sync {
    /// Lists role ids for which the user holds an assignment active at `at`.
    ///
    /// A row is active when `valid_from <= at` and `valid_to` is null or
    /// `valid_to >= at`. Overlapping windows may produce duplicates; any
    /// returned id counts.
    async fn list_active_role_ids(&self, user_id: UserId, at: DateTime<Utc>)
    -> AppResult<Vec<Uuid>>;

    /// Returns whether any of the roles carries a non-revoked grant for
    /// the (module, action) pair.
    async fn any_role_grants(
        &self,
        role_ids: &[Uuid],
        module: &str,
        action: ActionKind,
    ) -> AppResult<bool>;

    /// Finds the caller's role inside a team, if they are a member.
    async fn find_team_membership(
        &self,
        user_id: UserId,
        team_id: Uuid,
    ) -> AppResult<Option<TeamRole>>;
}

/// Outcome of the request-level authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// A permission was required and the caller holds it.
    Allowed,
    /// No check applied (unauthenticated caller, non-API path, or
    /// unmapped method); the request proceeds.
    Skipped,
    /// A permission was required and the caller lacks it.
    Denied,
}

/// Outcome of the team-scoped guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamAccessCheck {
    /// Caller may proceed.
    Allowed,
    /// No team identifier was supplied; a bad-request outcome, distinct
    /// from the forbidden denials.
    MissingTeamId,
    /// Caller has no membership row for the team.
    NotAMember,
    /// Caller is a member but the guard requires the leader role.
    LeaderRequired,
}

impl TeamAccessCheck {
    /// Returns the fixed denial message, if the check denied.
    #[must_use]
    pub fn denial_message(&self) -> Option<&'static str> {
        match self {
            Self::Allowed => None,
            Self::MissingTeamId => Some("team_id required"),
            Self::NotAMember => Some("not a team member"),
            Self::LeaderRequired => Some("must be team leader"),
        }
    }
}

/// Application service for request- and team-level authorization.
#[derive(Clone)]
pub struct AccessControlService {
    repository: Arc<dyn AccessControlRepository>,
}

impl AccessControlService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AccessControlRepository>) -> Self {
        Self { repository }
    }

    /// Resolves the authorization decision for one inbound request.
    ///
    /// Unauthenticated callers skip the check entirely; this mirrors the
    /// historical behavior and is deliberately not tightened here (the
    /// team guard behaves differently, which is a known inconsistency
    /// pending product clarification).
    pub async fn authorize(
        &self,
        identity: Option<&UserIdentity>,
        path: &str,
        method: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AccessDecision> {
        let Some(identity) = identity else {
            return Ok(AccessDecision::Skipped);
        };

        let Some(required) = classify_request(path, method) else {
            return Ok(AccessDecision::Skipped);
        };

        let role_ids = self
            .repository
            .list_active_role_ids(UserId::from_uuid(identity.user_id()), now)
            .await?;

        if role_ids.is_empty() {
            return Ok(AccessDecision::Denied);
        }

        let granted = self
            .repository
            .any_role_grants(&role_ids, required.module.as_str(), required.action)
            .await?;

        if granted {
            Ok(AccessDecision::Allowed)
        } else {
            Ok(AccessDecision::Denied)
        }
    }

    /// Checks whether the caller may act on a team.
    ///
    /// This is a role-equality check against the membership row; it does
    /// not consult the permission catalog. Superusers always pass.
    pub async fn require_team_role(
        &self,
        identity: &UserIdentity,
        team_id: Option<Uuid>,
        required: TeamRole,
    ) -> AppResult<TeamAccessCheck> {
        if identity.is_superuser() {
            return Ok(TeamAccessCheck::Allowed);
        }

        let Some(team_id) = team_id else {
            return Ok(TeamAccessCheck::MissingTeamId);
        };

        let membership = self
            .repository
            .find_team_membership(UserId::from_uuid(identity.user_id()), team_id)
            .await?;

        match membership {
            None => Ok(TeamAccessCheck::NotAMember),
            Some(role) if role == required => Ok(TeamAccessCheck::Allowed),
            Some(_) => Ok(TeamAccessCheck::LeaderRequired),
        }
    }

    /// Checks whether the caller belongs to a team at all.
    ///
    /// Any membership row passes, leader or plain member; read-only team
    /// endpoints use this instead of the role-equality guard. Superusers
    /// always pass.
    pub async fn require_team_membership(
        &self,
        identity: &UserIdentity,
        team_id: Option<Uuid>,
    ) -> AppResult<TeamAccessCheck> {
        if identity.is_superuser() {
            return Ok(TeamAccessCheck::Allowed);
        }

        let Some(team_id) = team_id else {
            return Ok(TeamAccessCheck::MissingTeamId);
        };

        let membership = self
            .repository
            .find_team_membership(UserId::from_uuid(identity.user_id()), team_id)
            .await?;

        match membership {
            None => Ok(TeamAccessCheck::NotAMember),
            Some(_) => Ok(TeamAccessCheck::Allowed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use markops_core::{AppResult, OrganizationId, UserIdentity};
    use markops_domain::{ActionKind, TeamRole, UserId};
    use uuid::Uuid;

    use super::{
        AccessControlRepository, AccessControlService, AccessDecision, TeamAccessCheck,
    };

    struct RoleWindow {
        role_id: Uuid,
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    }

    #[derive(Default)]
    struct FakeAccessControlRepository {
        windows: HashMap<UserId, Vec<RoleWindow>>,
        grants: Vec<(Uuid, String, ActionKind)>,
        memberships: HashMap<(UserId, Uuid), TeamRole>,
    }

    #[async_trait]
    impl AccessControlRepository for FakeAccessControlRepository {
        async fn list_active_role_ids(
            &self,
            user_id: UserId,
            at: DateTime<Utc>,
        ) -> AppResult<Vec<Uuid>> {
            Ok(self
                .windows
                .get(&user_id)
                .map(|windows| {
                    windows
                        .iter()
                        .filter(|window| {
                            window.valid_from <= at
                                && window.valid_to.is_none_or(|valid_to| valid_to >= at)
                        })
                        .map(|window| window.role_id)
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn any_role_grants(
            &self,
            role_ids: &[Uuid],
            module: &str,
            action: ActionKind,
        ) -> AppResult<bool> {
            Ok(self.grants.iter().any(|(role_id, grant_module, grant_action)| {
                role_ids.contains(role_id) && grant_module == module && *grant_action == action
            }))
        }

        async fn find_team_membership(
            &self,
            user_id: UserId,
            team_id: Uuid,
        ) -> AppResult<Option<TeamRole>> {
            Ok(self.memberships.get(&(user_id, team_id)).copied())
        }
    }

    fn identity(user_id: UserId, superuser: bool) -> UserIdentity {
        UserIdentity::new(
            user_id.as_uuid(),
            "bob",
            Some("bob@example.com".to_owned()),
            Some(OrganizationId::new()),
            superuser,
        )
    }

    fn service_with(repository: FakeAccessControlRepository) -> AccessControlService {
        AccessControlService::new(Arc::new(repository))
    }

    #[tokio::test]
    async fn active_role_with_grant_allows() {
        let user = UserId::new();
        let role_id = Uuid::new_v4();
        let now = Utc::now();
        let mut repository = FakeAccessControlRepository::default();
        repository.windows.insert(
            user,
            vec![RoleWindow {
                role_id,
                valid_from: now - Duration::days(2),
                valid_to: None,
            }],
        );
        repository
            .grants
            .push((role_id, "ASSET".to_owned(), ActionKind::View));

        let decision = service_with(repository)
            .authorize(Some(&identity(user, false)), "/api/assets/list/", "GET", now)
            .await;
        assert_eq!(decision.ok(), Some(AccessDecision::Allowed));
    }

    #[tokio::test]
    async fn expired_role_denies() {
        let user = UserId::new();
        let role_id = Uuid::new_v4();
        let now = Utc::now();
        let mut repository = FakeAccessControlRepository::default();
        repository.windows.insert(
            user,
            vec![RoleWindow {
                role_id,
                valid_from: now - Duration::days(2),
                valid_to: Some(now - Duration::days(1)),
            }],
        );
        repository
            .grants
            .push((role_id, "ASSET".to_owned(), ActionKind::View));

        let decision = service_with(repository)
            .authorize(Some(&identity(user, false)), "/api/assets/list/", "GET", now)
            .await;
        assert_eq!(decision.ok(), Some(AccessDecision::Denied));
    }

    #[tokio::test]
    async fn missing_grant_denies() {
        let user = UserId::new();
        let role_id = Uuid::new_v4();
        let now = Utc::now();
        let mut repository = FakeAccessControlRepository::default();
        repository.windows.insert(
            user,
            vec![RoleWindow {
                role_id,
                valid_from: now - Duration::days(2),
                valid_to: None,
            }],
        );
        repository
            .grants
            .push((role_id, "ASSET".to_owned(), ActionKind::View));

        let decision = service_with(repository)
            .authorize(
                Some(&identity(user, false)),
                "/api/campaigns/create/",
                "POST",
                now,
            )
            .await;
        assert_eq!(decision.ok(), Some(AccessDecision::Denied));
    }

    #[tokio::test]
    async fn approve_segment_requires_approve_grant() {
        let user = UserId::new();
        let role_id = Uuid::new_v4();
        let now = Utc::now();
        let mut repository = FakeAccessControlRepository::default();
        repository.windows.insert(
            user,
            vec![RoleWindow {
                role_id,
                valid_from: now,
                valid_to: None,
            }],
        );
        repository
            .grants
            .push((role_id, "CAMPAIGN".to_owned(), ActionKind::Approve));

        let decision = service_with(repository)
            .authorize(
                Some(&identity(user, false)),
                "/api/campaigns/1/approve/",
                "PUT",
                now,
            )
            .await;
        assert_eq!(decision.ok(), Some(AccessDecision::Allowed));
    }

    #[tokio::test]
    async fn unauthenticated_caller_skips_check() {
        let decision = service_with(FakeAccessControlRepository::default())
            .authorize(None, "/api/assets/list/", "GET", Utc::now())
            .await;
        assert_eq!(decision.ok(), Some(AccessDecision::Skipped));
    }

    #[tokio::test]
    async fn non_api_path_skips_check() {
        let user = UserId::new();
        let decision = service_with(FakeAccessControlRepository::default())
            .authorize(Some(&identity(user, false)), "/health", "GET", Utc::now())
            .await;
        assert_eq!(decision.ok(), Some(AccessDecision::Skipped));
    }

    #[tokio::test]
    async fn team_leader_is_allowed() {
        let user = UserId::new();
        let team_id = Uuid::new_v4();
        let mut repository = FakeAccessControlRepository::default();
        repository.memberships.insert((user, team_id), TeamRole::Leader);

        let check = service_with(repository)
            .require_team_role(&identity(user, false), Some(team_id), TeamRole::Leader)
            .await;
        assert_eq!(check.ok(), Some(TeamAccessCheck::Allowed));
    }

    #[tokio::test]
    async fn plain_member_needs_leader_role() {
        let user = UserId::new();
        let team_id = Uuid::new_v4();
        let mut repository = FakeAccessControlRepository::default();
        repository.memberships.insert((user, team_id), TeamRole::Member);

        let check = service_with(repository)
            .require_team_role(&identity(user, false), Some(team_id), TeamRole::Leader)
            .await
            .ok();
        assert_eq!(check, Some(TeamAccessCheck::LeaderRequired));
        assert_eq!(
            check.and_then(|value| value.denial_message()),
            Some("must be team leader")
        );
    }

    #[tokio::test]
    async fn stranger_is_not_a_member() {
        let user = UserId::new();
        let team_id = Uuid::new_v4();

        let check = service_with(FakeAccessControlRepository::default())
            .require_team_role(&identity(user, false), Some(team_id), TeamRole::Leader)
            .await
            .ok();
        assert_eq!(check, Some(TeamAccessCheck::NotAMember));
        assert_eq!(
            check.and_then(|value| value.denial_message()),
            Some("not a team member")
        );
    }

    #[tokio::test]
    async fn leader_counts_as_a_member() {
        let user = UserId::new();
        let team_id = Uuid::new_v4();
        let mut repository = FakeAccessControlRepository::default();
        repository.memberships.insert((user, team_id), TeamRole::Leader);

        let check = service_with(repository)
            .require_team_membership(&identity(user, false), Some(team_id))
            .await;
        assert_eq!(check.ok(), Some(TeamAccessCheck::Allowed));
    }

    #[tokio::test]
    async fn plain_member_passes_the_membership_guard() {
        let user = UserId::new();
        let team_id = Uuid::new_v4();
        let mut repository = FakeAccessControlRepository::default();
        repository.memberships.insert((user, team_id), TeamRole::Member);

        let check = service_with(repository)
            .require_team_membership(&identity(user, false), Some(team_id))
            .await;
        assert_eq!(check.ok(), Some(TeamAccessCheck::Allowed));
    }

    #[tokio::test]
    async fn membership_guard_excludes_strangers() {
        let user = UserId::new();
        let team_id = Uuid::new_v4();

        let check = service_with(FakeAccessControlRepository::default())
            .require_team_membership(&identity(user, false), Some(team_id))
            .await;
        assert_eq!(check.ok(), Some(TeamAccessCheck::NotAMember));
    }

    #[tokio::test]
    async fn superuser_bypasses_team_guard() {
        let user = UserId::new();

        let check = service_with(FakeAccessControlRepository::default())
            .require_team_role(&identity(user, true), None, TeamRole::Leader)
            .await;
        assert_eq!(check.ok(), Some(TeamAccessCheck::Allowed));
    }

    #[tokio::test]
    async fn missing_team_id_is_a_distinct_outcome() {
        let user = UserId::new();

        let check = service_with(FakeAccessControlRepository::default())
            .require_team_role(&identity(user, false), None, TeamRole::Leader)
            .await
            .ok();
        assert_eq!(check, Some(TeamAccessCheck::MissingTeamId));
        assert_eq!(
            check.and_then(|value| value.denial_message()),
            Some("team_id required")
        );
    }
}
