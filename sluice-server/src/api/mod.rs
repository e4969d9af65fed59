//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod build;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod queue;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::database::Database;
use crate::queue::Queue;
use crate::service::pipeline::Compilers;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub queue: Arc<dyn Queue>,
    pub compilers: Compilers,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Pipeline endpoints
        .route("/pipeline/compile", post(pipeline::compile_pipeline))
        // Build endpoints
        .route("/build/create", post(build::create_build))
        .route("/build/{id}", get(build::get_build))
        .route("/build/{id}/steps", get(build::list_steps))
        .route("/build/{id}/steps/{number}", get(build::get_step))
        .route("/build/{id}/services", get(build::list_services))
        .route("/build/{id}/kill", post(build::kill_build))
        // Repository and statistics endpoints
        .route("/repo/{repo_id}/builds/last", get(build::last_build_for_repo))
        .route("/steps/status", get(build::step_status_counts))
        // Worker endpoints
        .route("/queue/pop", post(queue::pop))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
