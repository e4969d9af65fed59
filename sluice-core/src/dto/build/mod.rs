//! Build DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Build;
use crate::pipeline::RuleData;

/// Request to create a build from a pipeline document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBuild {
    pub repo_id: Uuid,
    pub org: String,
    pub repo: String,
    pub commit: String,
    pub branch: String,
    pub event: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Files changed by the commit, used by `path` rules
    #[serde(default)]
    pub changed_files: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Raw pipeline YAML
    pub pipeline: String,
}

impl CreateBuild {
    /// Metadata rulesets are evaluated against for this build
    pub fn rule_data(&self) -> RuleData {
        RuleData {
            branch: self.branch.clone(),
            event: self.event.clone(),
            path: self.changed_files.clone(),
            repo: format!("{}/{}", self.org, self.repo),
            status: "pending".to_string(),
            tag: self.tag.clone().unwrap_or_default(),
            target: self.target.clone().unwrap_or_default(),
            label: self.labels.clone(),
            ..Default::default()
        }
    }
}

/// Request to kill a running build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KillBuild {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Build together with its planned execution records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub build: Build,
    pub steps: Vec<crate::domain::Step>,
    pub services: Vec<crate::domain::Service>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_data_from_request() {
        let req = CreateBuild {
            repo_id: Uuid::new_v4(),
            org: "octocat".to_string(),
            repo: "hello-world".to_string(),
            commit: "123abc456def".to_string(),
            branch: "main".to_string(),
            event: "push".to_string(),
            tag: None,
            target: Some("production".to_string()),
            changed_files: vec!["src/main.rs".to_string()],
            labels: vec![],
            pipeline: String::new(),
        };

        let data = req.rule_data();
        assert_eq!(data.branch, "main");
        assert_eq!(data.repo, "octocat/hello-world");
        assert_eq!(data.target, "production");
        assert_eq!(data.tag, "");
        assert_eq!(data.path, vec!["src/main.rs"]);
    }
}
