//! Pipeline DTOs

use serde::{Deserialize, Serialize};

use crate::pipeline::RuleData;

/// Request to compile a pipeline without creating a build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilePipeline {
    pub org: String,
    pub repo: String,
    /// Commit `file` templates are read at
    pub commit: String,
    #[serde(default)]
    pub rules: RuleData,
    /// Raw pipeline YAML
    pub pipeline: String,
}
