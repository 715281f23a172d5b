use markops_core::AppError;
use serde::{Deserialize, Serialize};

/// Numeric sentinel for the team leader role.
pub const TEAM_ROLE_LEADER: i32 = 2;

/// Numeric sentinel for the plain member role.
pub const TEAM_ROLE_MEMBER: i32 = 3;

/// Role a user holds inside a single team.
///
/// The numeric sentinels are wire- and storage-stable; the team guard
/// compares roles by equality and never consults the permission catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// May manage team membership.
    Leader,
    /// Regular team member.
    Member,
}

impl TeamRole {
    /// Returns the stable numeric identifier for this role.
    #[must_use]
    pub fn as_id(&self) -> i32 {
        match self {
            Self::Leader => TEAM_ROLE_LEADER,
            Self::Member => TEAM_ROLE_MEMBER,
        }
    }

    /// Returns the display name for this role.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Leader => "Team Leader",
            Self::Member => "Member",
        }
    }

    /// Parses a numeric role identifier.
    pub fn from_id(value: i32) -> Result<Self, AppError> {
        match value {
            TEAM_ROLE_LEADER => Ok(Self::Leader),
            TEAM_ROLE_MEMBER => Ok(Self::Member),
            _ => Err(AppError::Validation(format!(
                "invalid team role id {value}"
            ))),
        }
    }

    /// Returns whether this role can manage team membership.
    #[must_use]
    pub fn can_manage_team(&self) -> bool {
        matches!(self, Self::Leader)
    }
}

#[cfg(test)]
mod tests {
    use super::{TEAM_ROLE_LEADER, TEAM_ROLE_MEMBER, TeamRole};

    #[test]
    fn role_ids_are_stable() {
        assert_eq!(TeamRole::Leader.as_id(), TEAM_ROLE_LEADER);
        assert_eq!(TeamRole::Member.as_id(), TEAM_ROLE_MEMBER);
    }

    #[test]
    fn unknown_role_id_is_rejected() {
        assert!(TeamRole::from_id(1).is_err());
        assert!(TeamRole::from_id(0).is_err());
    }

    #[test]
    fn only_leader_manages_team() {
        assert!(TeamRole::Leader.can_manage_team());
        assert!(!TeamRole::Member.can_manage_team());
    }
}
