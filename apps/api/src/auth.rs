//! Session-based authentication handlers.

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use markops_application::{RegisterUserInput, VerificationOutcome};
use markops_core::{AppError, UserIdentity};
use markops_domain::UserId;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::dto::{
    GenericMessageResponse, LoginRequest, ProfileResponse, RegisterRequest, SsoCallbackResponse,
    UserIdentityResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SsoCallbackQuery {
    pub email: Option<String>,
}

/// POST /auth/register - Create a new account with email+password.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<GenericMessageResponse>)> {
    state
        .user_service
        .register(RegisterUserInput {
            email: payload.email,
            password: payload.password,
            display_name: payload.display_name,
            organization_id: None,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GenericMessageResponse {
            message: "a link to activate your account has been emailed to the address provided"
                .to_owned(),
        }),
    ))
}

/// GET /auth/verify - Consume an emailed verification token.
pub async fn verify_email_handler(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let outcome = state.user_service.verify_email(&query.token).await?;

    let message = match outcome {
        VerificationOutcome::Verified => "email address verified",
        VerificationOutcome::AlreadyVerified => "email address was already verified",
    };

    Ok(Json(GenericMessageResponse {
        message: message.to_owned(),
    }))
}

/// POST /auth/login - Authenticate with email+password and open a session.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    establish_session(&session, &identity).await?;

    Ok(Json(UserIdentityResponse::from(&identity)))
}

/// POST /auth/logout - Destroy the current session.
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Profile of the authenticated user.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .user_service
        .profile(UserId::from_uuid(identity.user_id()))
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// GET /auth/sso/login - Hand the client the provider redirect URL.
pub async fn sso_login_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"redirect_url": state.sso_service.login_redirect_url()}))
}

/// GET /auth/sso/callback - Complete the provider round trip and open a
/// session for the resolved user.
pub async fn sso_callback_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SsoCallbackQuery>,
) -> ApiResult<Json<SsoCallbackResponse>> {
    let outcome = state
        .sso_service
        .complete_callback(query.email.as_deref())
        .await?;

    establish_session(&session, &outcome.identity).await?;

    Ok(Json(SsoCallbackResponse::from(&outcome)))
}

/// Cycles the session id and stores the identity under the session key.
async fn establish_session(session: &Session, identity: &UserIdentity) -> ApiResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(())
}
