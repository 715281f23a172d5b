use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use markops_application::AccessDecision;
use markops_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Requires an authenticated session and stashes the identity in the
/// request extensions for handlers.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| ApiError::App(AppError::Unauthorized("authentication required".to_owned())))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Request-level permission enforcement for module-scoped API routes.
///
/// Derives the required permission from the path and method and denies
/// with the fixed payload when an authenticated caller lacks it.
/// Unauthenticated callers and unmapped requests pass through.
pub async fn enforce_module_permissions(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?;

    let decision = state
        .access_control_service
        .authorize(
            identity.as_ref(),
            request.uri().path(),
            request.method().as_str(),
            Utc::now(),
        )
        .await?;

    if decision == AccessDecision::Denied {
        return Err(ApiError::PermissionDenied);
    }

    Ok(next.run(request).await)
}
