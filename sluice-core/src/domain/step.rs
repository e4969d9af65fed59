//! Step domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Build, Status};

/// Step execution record
///
/// Created pending by the planner, one per resolved step, numbered in
/// traversal order of the resolved pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub build_id: Uuid,
    pub repo_id: Uuid,
    pub number: i32,
    pub name: String,
    pub image: String,
    /// Name of the owning stage, empty for top-level steps
    pub stage: String,
    pub status: Status,
    pub error: Option<String>,
    pub exit_code: Option<i32>,
    pub created: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
}

impl Step {
    /// Builds a pending step for `build`
    pub fn pending(build: &Build, number: i32, name: &str, image: &str, stage: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            build_id: build.id,
            repo_id: build.repo_id,
            number,
            name: name.to_string(),
            image: image.to_string(),
            stage: stage.to_string(),
            status: Status::Pending,
            error: None,
            exit_code: None,
            created: Utc::now(),
            started: None,
            finished: None,
        }
    }

    /// Runtime variables describing this step, injected into its container
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("SLUICE_STEP_NAME".to_string(), self.name.clone());
        env.insert("SLUICE_STEP_IMAGE".to_string(), self.image.clone());
        env.insert("SLUICE_STEP_NUMBER".to_string(), self.number.to_string());
        env.insert("SLUICE_STEP_STAGE".to_string(), self.stage.clone());
        env.insert("SLUICE_STEP_STATUS".to_string(), self.status.to_string());
        env.insert(
            "SLUICE_STEP_CREATED".to_string(),
            self.created.timestamp().to_string(),
        );
        env
    }
}
