//! Repository Module
//!
//! Data access layer for the server.
//! Each repository handles database operations for a specific domain entity.

pub mod build;
pub mod log;
pub mod service;
pub mod step;

// Re-export for convenience
pub use build as build_repository;
pub use log as log_repository;
pub use service as service_repository;
pub use step as step_repository;

use sluice_core::domain::Status;

/// Statuses are stored as their lowercase names
pub(crate) fn parse_status(value: &str) -> Status {
    value.parse().unwrap_or_else(|e| {
        tracing::warn!("Unknown status in database: {}", e);
        Status::Error
    })
}
