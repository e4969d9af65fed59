//! Queue API Handlers
//!
//! Workers pull planned builds from here.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /queue/pop
/// Take the next queued build, or 204 when nothing is queued
pub async fn pop(State(state): State<AppState>) -> ApiResult<Response> {
    let item = state
        .queue
        .pop()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    match item {
        Some(item) => {
            tracing::info!("Build {} handed to worker", item.build.id);
            Ok(Json(item).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
