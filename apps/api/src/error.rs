use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use markops_core::AppError;
use serde::Serialize;
use serde_json::json;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../packages/api-types/src/generated/error-response.ts")]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
///
/// Two denial shapes deviate from the generic payload on purpose: the
/// request-level permission check always answers with a fixed
/// `{"detail": ...}` body, and the team guard answers with
/// `{"error": ...}`. Clients depend on both shapes.
#[derive(Debug)]
pub enum ApiError {
    /// A core application error with the standard payload.
    App(AppError),
    /// The request-level permission check denied the request.
    PermissionDenied,
    /// The team guard denied the request.
    TeamGuard {
        status: StatusCode,
        message: &'static str,
    },
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::App(error) => {
                let status = match error {
                    AppError::Validation(_) => StatusCode::BAD_REQUEST,
                    AppError::NotFound(_) => StatusCode::NOT_FOUND,
                    AppError::Conflict(_) => StatusCode::CONFLICT,
                    AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    AppError::Forbidden(_) => StatusCode::FORBIDDEN,
                    AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };

                let payload = Json(ErrorResponse {
                    message: error.to_string(),
                });

                (status, payload).into_response()
            }
            Self::PermissionDenied => (
                StatusCode::FORBIDDEN,
                Json(json!({"detail": "Permission denied"})),
            )
                .into_response(),
            Self::TeamGuard { status, message } => {
                (status, Json(json!({"error": message}))).into_response()
            }
        }
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
