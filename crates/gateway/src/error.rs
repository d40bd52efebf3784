use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use revq_core::error::{ActionError, UpstreamError};
use revq_queue::WorkflowError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the read/write error taxonomy from `revq-core` plus the workflow
/// errors, and implements [`IntoResponse`] to produce consistent JSON
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A read against the backend failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A write against the backend failed.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The confirmation workflow refused or failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The addressed resource does not exist (in the current view).
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Upstream(err) => {
                tracing::error!(error = %err, "Upstream read failed");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
            }

            AppError::Action(err) => (action_status(err), "ACTION_FAILED", err.to_string()),

            AppError::Workflow(err) => match err {
                WorkflowError::NotOpen | WorkflowError::InFlight => (
                    StatusCode::CONFLICT,
                    "WORKFLOW_CONFLICT",
                    err.to_string(),
                ),
                WorkflowError::Action(action) => {
                    (action_status(action), "ACTION_FAILED", err.to_string())
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a backend action failure onto a gateway status code.
///
/// Backend 4xx statuses pass through (they describe the caller's request);
/// transport failures and 5xx responses surface as 502.
fn action_status(err: &ActionError) -> StatusCode {
    match err.status() {
        Some(status) if (400..500).contains(&status) => {
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}
