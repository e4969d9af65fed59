//! Build API Handlers
//!
//! HTTP endpoints for build creation, inspection and termination.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use sluice_core::domain::{Build, Service, Step};
use std::collections::BTreeMap;
use sluice_core::dto::build::{BuildSummary, CreateBuild, KillBuild};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::build_service;

// =============================================================================
// Build Lifecycle Endpoints
// =============================================================================

/// POST /build/create
/// Compile a pipeline, plan its records and enqueue the build
pub async fn create_build(
    State(state): State<AppState>,
    Json(req): Json<CreateBuild>,
) -> ApiResult<Json<BuildSummary>> {
    tracing::info!("Creating build for {}/{} at {}", req.org, req.repo, req.commit);

    let summary = build_service::create_build(
        state.db.as_ref(),
        state.queue.as_ref(),
        &state.compilers,
        req,
    )
    .await?;

    Ok(Json(summary))
}

/// POST /build/{id}/kill
/// Kill a build and every step and service still in flight
pub async fn kill_build(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    req: Option<Json<KillBuild>>,
) -> ApiResult<Json<BuildSummary>> {
    tracing::info!("Killing build: {}", id);

    let reason = req.and_then(|Json(req)| req.reason);
    let summary = build_service::kill_build(state.db.as_ref(), id, reason).await?;
    Ok(Json(summary))
}

// =============================================================================
// Build Query Endpoints
// =============================================================================

/// GET /build/{id}
pub async fn get_build(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Build>> {
    tracing::debug!("Getting build: {}", id);

    let build = build_service::get_build(state.db.as_ref(), id).await?;
    Ok(Json(build))
}

/// GET /build/{id}/steps
pub async fn list_steps(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Step>>> {
    tracing::debug!("Listing steps for build: {}", id);

    let steps = state.db.list_steps_for_build(id).await?;
    Ok(Json(steps))
}

/// GET /build/{id}/steps/{number}
pub async fn get_step(
    State(state): State<AppState>,
    Path((id, number)): Path<(Uuid, String)>,
) -> ApiResult<Json<Step>> {
    let number = parse_step_number(&number)?;
    tracing::debug!("Getting step {} for build: {}", number, id);

    let step = state.db.get_step_for_build(id, number).await?;
    Ok(Json(step))
}

/// GET /build/{id}/services
pub async fn list_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Service>>> {
    tracing::debug!("Listing services for build: {}", id);

    let services = state.db.list_services_for_build(id).await?;
    Ok(Json(services))
}

/// Query parameters for the last build of a repository
#[derive(Debug, Deserialize)]
pub struct LastBuildQuery {
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

/// GET /repo/{repo_id}/builds/last
pub async fn last_build_for_repo(
    State(state): State<AppState>,
    Path(repo_id): Path<Uuid>,
    Query(query): Query<LastBuildQuery>,
) -> ApiResult<Json<Build>> {
    tracing::debug!("Getting last build for repo {} on {}", repo_id, query.branch);

    let build = state
        .db
        .last_build_for_repo(repo_id, &query.branch)
        .await?;
    Ok(Json(build))
}

// =============================================================================
// Step Statistics
// =============================================================================

/// GET /steps/status
/// Number of steps in each status across every build
pub async fn step_status_counts(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, i64>>> {
    let counts = state.db.count_steps_by_status().await?;
    Ok(Json(counts))
}

fn parse_step_number(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::BadRequest(format!("malformed step parameter provided: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step_number() {
        assert_eq!(parse_step_number("1").unwrap(), 1);
        assert_eq!(parse_step_number("42").unwrap(), 42);

        let err = parse_step_number("foo").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "malformed step parameter provided: foo"));
    }
}
