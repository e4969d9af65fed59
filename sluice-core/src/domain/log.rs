//! Log domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Log record for one step or service
///
/// Created empty at plan time; workers append to `data` while the
/// container runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub id: Uuid,
    pub build_id: Uuid,
    pub repo_id: Uuid,
    pub step_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub data: String,
    pub created: DateTime<Utc>,
}

impl Log {
    /// Empty log owned by a step
    pub fn for_step(build_id: Uuid, repo_id: Uuid, step_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            build_id,
            repo_id,
            step_id: Some(step_id),
            service_id: None,
            data: String::new(),
            created: Utc::now(),
        }
    }

    /// Empty log owned by a service
    pub fn for_service(build_id: Uuid, repo_id: Uuid, service_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            build_id,
            repo_id,
            step_id: None,
            service_id: Some(service_id),
            data: String::new(),
            created: Utc::now(),
        }
    }
}
