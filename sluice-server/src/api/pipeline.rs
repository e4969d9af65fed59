//! Pipeline API Handlers
//!
//! HTTP endpoints for compiling pipeline documents.

use axum::{Json, extract::State};
use sluice_core::dto::pipeline::CompilePipeline;
use sluice_core::pipeline::Pipeline;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::pipeline_service;

/// POST /pipeline/compile
/// Compile a pipeline document and return the resolved pipeline
pub async fn compile_pipeline(
    State(state): State<AppState>,
    Json(req): Json<CompilePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Compiling pipeline for {}/{}", req.org, req.repo);

    let pipeline = pipeline_service::compile_pipeline(&state.compilers, req)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(pipeline))
}
