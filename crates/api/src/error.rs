use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::services::LeaderboardError;

#[derive(Debug)]
pub enum AppError {
    /// Internal errors - logged but return generic 500 to user
    Internal(anyhow::Error),
    /// User-facing errors - message is safe to show
    External(StatusCode, &'static str),
    /// Validation errors - safe to show
    Validation(String),
}

impl AppError {
    /// Classifies a ranking engine error into a response class: missing
    /// members are 404, expired or malformed identifiers and bad arguments
    /// are 400, storage failures are 500.
    pub fn from_ranking(err: LeaderboardError) -> Self {
        match err {
            LeaderboardError::MemberNotFound { .. } => {
                AppError::External(StatusCode::NOT_FOUND, "Member not found.")
            }
            LeaderboardError::Expiration(inner) => AppError::Validation(inner.to_string()),
            invalid @ LeaderboardError::InvalidPercentage(_) => {
                AppError::Validation(invalid.to_string())
            }
            LeaderboardError::Storage(inner) => AppError::Internal(inner),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            AppError::Internal(err) => {
                tracing::error!("internal error: {:?}", err);
                sentry::capture_error(
                    err.as_ref() as &(dyn std::error::Error + Send + Sync + 'static)
                );

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::External(status, msg) => (status, msg.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "success": false, "reason": reason }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}
