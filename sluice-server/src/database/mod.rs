//! Database Module
//!
//! The persistence boundary used by the planner and the lifecycle
//! controller. [`PgDatabase`] backs it with the Postgres repositories,
//! [`MemoryDatabase`] keeps everything in process.

pub mod memory;
pub mod postgres;

pub use memory::{Fault, MemoryDatabase};
pub use postgres::PgDatabase;

use async_trait::async_trait;
use sluice_core::domain::{Build, Log, Service, Status, Step};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by a [`Database`]
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(String),

    /// A unique constraint rejected the record
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store refused the operation
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Persistence operations on build, step, service and log records
///
/// Every call takes a populated record and returns the record as stored.
#[async_trait]
pub trait Database: Send + Sync {
    /// Insert a build; the store assigns its per-repository number
    async fn create_build(&self, build: &Build) -> Result<Build, DatabaseError>;

    async fn get_build(&self, id: Uuid) -> Result<Build, DatabaseError>;

    async fn update_build(&self, build: &Build) -> Result<Build, DatabaseError>;

    /// Highest-numbered build of a repository on `branch`
    async fn last_build_for_repo(&self, repo_id: Uuid, branch: &str)
    -> Result<Build, DatabaseError>;

    async fn create_step(&self, step: &Step) -> Result<Step, DatabaseError>;

    async fn update_step(&self, step: &Step) -> Result<Step, DatabaseError>;

    async fn list_steps_for_build(&self, build_id: Uuid) -> Result<Vec<Step>, DatabaseError>;

    async fn get_step_for_build(&self, build_id: Uuid, number: i32)
    -> Result<Step, DatabaseError>;

    async fn create_service(&self, service: &Service) -> Result<Service, DatabaseError>;

    async fn update_service(&self, service: &Service) -> Result<Service, DatabaseError>;

    async fn list_services_for_build(&self, build_id: Uuid)
    -> Result<Vec<Service>, DatabaseError>;

    async fn create_log(&self, log: &Log) -> Result<Log, DatabaseError>;

    /// Number of steps in each status across every build
    async fn count_steps_by_status(&self) -> Result<BTreeMap<String, i64>, DatabaseError>;
}

/// Every known status starts at zero so absent ones still show up
pub(crate) fn status_counts<I>(counts: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = (String, i64)>,
{
    let mut totals: BTreeMap<String, i64> = Status::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for (status, count) in counts {
        *totals.entry(status).or_insert(0) += count;
    }
    totals
}

/// Unsaved pending build of `octocat/hello-world`
#[cfg(test)]
pub(crate) fn sample_build(repo_id: Uuid) -> Build {
    Build {
        id: Uuid::new_v4(),
        repo_id,
        number: 0,
        org: "octocat".to_string(),
        repo: "hello-world".to_string(),
        commit: "7fd1a60".to_string(),
        branch: "main".to_string(),
        event: "push".to_string(),
        tag: None,
        target: None,
        status: Status::Pending,
        error: None,
        created: chrono::Utc::now(),
        enqueued: None,
        started: None,
        finished: None,
    }
}
