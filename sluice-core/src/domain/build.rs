//! Build domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Status;

/// Build record
///
/// One run of a repository's pipeline. Steps and services hang off it by
/// `build_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: Uuid,
    pub repo_id: Uuid,
    /// Per-repository sequence number, assigned on creation
    pub number: i64,
    pub org: String,
    pub repo: String,
    pub commit: String,
    pub branch: String,
    pub event: String,
    pub tag: Option<String>,
    pub target: Option<String>,
    pub status: Status,
    pub error: Option<String>,
    pub created: DateTime<Utc>,
    pub enqueued: Option<DateTime<Utc>>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
}

impl Build {
    /// `org/repo` as shown in logs and error messages
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }
}
