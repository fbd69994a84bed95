//! Boundary errors and their uniform JSON response.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use montage_core::{ErrorResponse, PipelineError};

/// Anything that can go wrong while serving a merge.
///
/// Every variant is answered with `500 {"detail": <message>}`; the kind is
/// only visible in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Merge timed out after {0:?}")]
    Timeout(Duration),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        match &self {
            ApiError::Pipeline(e) => {
                tracing::error!(kind = ?e.kind(), "Merge failed: {detail}");
            }
            ApiError::Timeout(_) => {
                tracing::error!(kind = "timeout", "Merge failed: {detail}");
            }
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { detail }),
        )
            .into_response()
    }
}
