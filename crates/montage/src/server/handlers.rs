//! Request handlers.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use montage_core::{MergeRequest, MergeResponse, PipelineError, VERSION};
use serde::Serialize;

use super::error::ApiError;
use super::AppState;

/// `POST /` and `POST /merge`.
///
/// The body is parsed by hand rather than with the `Json` extractor so that
/// unreadable or malformed bodies get the same `500 {detail}` answer as
/// every other failure.
pub async fn merge(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MergeResponse>, ApiError> {
    let start = Instant::now();
    let body = body.map_err(|e| PipelineError::InvalidRequest(e.body_text()))?;
    let request: MergeRequest = serde_json::from_slice(&body)
        .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;
    let count = request.images.len();

    let outcome = tokio::time::timeout(state.request_timeout, state.montage.merge(request))
        .await
        .map_err(|_| ApiError::Timeout(state.request_timeout))??;

    tracing::info!(
        "Merged {} images into {} in {:?}",
        count,
        outcome.key,
        start.elapsed()
    );
    Ok(Json(MergeResponse::from(&outcome)))
}

/// Liveness probe body.
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health`.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: VERSION,
    })
}
