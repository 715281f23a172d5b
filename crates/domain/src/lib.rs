//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod campaign;
mod classifier;
mod preferences;
mod security;
mod team;
mod user;

pub use campaign::{
    Campaign, CampaignAssignmentRole, CampaignMetricSample, CampaignStatus, CampaignType,
};
pub use classifier::classify_request;
pub use preferences::{
    NotificationTrigger, QuietHoursWindow, UserPreferences, notification_permission_requirement,
};
pub use security::{ActionKind, Module, PermissionKey};
pub use team::{TEAM_ROLE_LEADER, TEAM_ROLE_MEMBER, TeamRole};
pub use user::{EmailAddress, PASSWORD_MIN_LENGTH, UserId, validate_password};
