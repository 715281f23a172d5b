use std::fmt::{Display, Formatter};
use std::str::FromStr;

use markops_core::AppError;
use serde::{Deserialize, Serialize};

/// Coarse resource category forming one axis of the permission key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Module {
    /// Creative assets.
    Asset,
    /// Marketing campaigns.
    Campaign,
    /// Budget allocations.
    Budget,
}

impl Module {
    /// Returns a stable storage value for this module.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Campaign => "CAMPAIGN",
            Self::Budget => "BUDGET",
        }
    }

    /// Returns all known modules.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Module] = &[Module::Asset, Module::Campaign, Module::Budget];

        ALL
    }
}

impl FromStr for Module {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ASSET" => Ok(Self::Asset),
            "CAMPAIGN" => Ok(Self::Campaign),
            "BUDGET" => Ok(Self::Budget),
            _ => Err(AppError::Validation(format!(
                "unknown module value '{value}'"
            ))),
        }
    }
}

/// Operation category forming the other axis of the permission key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Read access.
    View,
    /// Create or update access.
    Edit,
    /// Approval workflow access.
    Approve,
    /// Delete access.
    Delete,
    /// Data export access.
    Export,
}

impl ActionKind {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Edit => "EDIT",
            Self::Approve => "APPROVE",
            Self::Delete => "DELETE",
            Self::Export => "EXPORT",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ActionKind] = &[
            ActionKind::View,
            ActionKind::Edit,
            ActionKind::Approve,
            ActionKind::Delete,
            ActionKind::Export,
        ];

        ALL
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "VIEW" => Ok(Self::View),
            "EDIT" => Ok(Self::Edit),
            "APPROVE" => Ok(Self::Approve),
            "DELETE" => Ok(Self::Delete),
            "EXPORT" => Ok(Self::Export),
            _ => Err(AppError::Validation(format!(
                "unknown action value '{value}'"
            ))),
        }
    }
}

/// Permission requirement derived for a request or granted to a role.
///
/// The module side is carried as the raw derived string rather than a
/// parsed [`Module`]: the classifier produces whatever the path segment
/// yields, and a value outside the catalog simply never matches a grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionKey {
    /// Module axis, upper-cased storage string.
    pub module: String,
    /// Action axis.
    pub action: ActionKind,
}

impl PermissionKey {
    /// Creates a permission key from a catalog module and action.
    #[must_use]
    pub fn new(module: Module, action: ActionKind) -> Self {
        Self {
            module: module.as_str().to_owned(),
            action,
        }
    }

    /// Creates a permission key from a lexically derived module string.
    #[must_use]
    pub fn from_derived(module: impl Into<String>, action: ActionKind) -> Self {
        Self {
            module: module.into(),
            action,
        }
    }

    /// Parses a `MODULE:ACTION` transport value.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        let (module, action) = value.split_once(':').ok_or_else(|| {
            AppError::Validation(format!(
                "permission value '{value}' must use MODULE:ACTION form"
            ))
        })?;

        let module = Module::from_str(module)?;
        let action = ActionKind::from_str(action)?;
        Ok(Self::new(module, action))
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.module, self.action.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ActionKind, Module, PermissionKey};

    #[test]
    fn module_roundtrip_storage_value() {
        for module in Module::all() {
            let restored = Module::from_str(module.as_str());
            assert_eq!(restored.ok(), Some(*module));
        }
    }

    #[test]
    fn action_roundtrip_storage_value() {
        for action in ActionKind::all() {
            let restored = ActionKind::from_str(action.as_str());
            assert_eq!(restored.ok(), Some(*action));
        }
    }

    #[test]
    fn unknown_module_is_rejected() {
        assert!(Module::from_str("WIDGET").is_err());
    }

    #[test]
    fn permission_key_parses_transport_form() {
        let parsed = PermissionKey::from_transport("CAMPAIGN:APPROVE");
        assert_eq!(
            parsed.ok(),
            Some(PermissionKey::new(Module::Campaign, ActionKind::Approve))
        );
    }

    #[test]
    fn permission_key_rejects_missing_separator() {
        assert!(PermissionKey::from_transport("CAMPAIGNAPPROVE").is_err());
    }

    #[test]
    fn permission_key_displays_colon_form() {
        let key = PermissionKey::new(Module::Asset, ActionKind::Export);
        assert_eq!(key.to_string(), "ASSET:EXPORT");
    }
}
