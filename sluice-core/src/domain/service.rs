//! Service domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Build, Status};

/// Service execution record (sidecar containers that live for the whole build)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub build_id: Uuid,
    pub repo_id: Uuid,
    pub number: i32,
    pub name: String,
    pub image: String,
    pub status: Status,
    pub error: Option<String>,
    pub exit_code: Option<i32>,
    pub created: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
}

impl Service {
    pub fn pending(build: &Build, number: i32, name: &str, image: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            build_id: build.id,
            repo_id: build.repo_id,
            number,
            name: name.to_string(),
            image: image.to_string(),
            status: Status::Pending,
            error: None,
            exit_code: None,
            created: Utc::now(),
            started: None,
            finished: None,
        }
    }
}
