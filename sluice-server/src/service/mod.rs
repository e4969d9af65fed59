//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between the compiler, the database and the queue.

pub mod build;
pub mod pipeline;
pub mod services;
pub mod steps;

// Re-export for convenience
pub use build as build_service;
pub use pipeline as pipeline_service;
pub use services as service_planner;
pub use steps as step_planner;

use crate::database::DatabaseError;

/// A planning pass that stopped part way
///
/// `planned` holds every record that was persisted before the failure so the
/// caller can clean them up.
#[derive(Debug)]
pub struct PlanError<T> {
    pub planned: Vec<T>,
    pub message: String,
    pub source: DatabaseError,
}

impl<T> std::fmt::Display for PlanError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.message, self.source)
    }
}

impl<T: std::fmt::Debug> std::error::Error for PlanError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
