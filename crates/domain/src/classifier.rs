use crate::security::{ActionKind, PermissionKey};

/// Derives the permission required by an inbound request, if any.
///
/// The derivation is lexical: the module comes from the second path
/// segment with one trailing `s` stripped and upper-cased
/// (`assets` becomes `ASSET`), and the action comes either from a
/// positional `approve`/`export` segment or from the HTTP method.
/// Paths outside `/api/...` and methods outside the table require no
/// check. The heuristic is brittle for irregular plurals; it is kept
/// as-is pending a declarative route-to-permission table.
#[must_use]
pub fn classify_request(path: &str, method: &str) -> Option<PermissionKey> {
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    if parts.len() < 2 || parts[0] != "api" {
        return None;
    }

    let module = parts[1].trim_end_matches('s').to_uppercase();

    let action = if parts.len() >= 4 && parts[3] == "approve" {
        ActionKind::Approve
    } else if parts.len() >= 4 && parts[3] == "export" {
        ActionKind::Export
    } else {
        method_action(method)?
    };

    Some(PermissionKey::from_derived(module, action))
}

fn method_action(method: &str) -> Option<ActionKind> {
    match method {
        "GET" => Some(ActionKind::View),
        "POST" | "PUT" => Some(ActionKind::Edit),
        "PATCH" => Some(ActionKind::Approve),
        "DELETE" => Some(ActionKind::Delete),
        _ => None,
    }
}
