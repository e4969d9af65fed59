//! Queue DTOs

use serde::{Deserialize, Serialize};

use crate::domain::Build;
use crate::pipeline::Pipeline;

/// Unit of work handed to workers: a planned build and its resolved pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub build: Build,
    pub pipeline: Pipeline,
}
