//! Secret declarations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{PullPolicy, Value};

/// Visibility scope of a secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretScope {
    #[default]
    Repo,
    Org,
    Shared,
}

/// When the secret value is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretPull {
    #[default]
    BuildStart,
    StepStart,
}

fn default_engine() -> String {
    "native".to_string()
}

/// Secret declared by a pipeline or contributed by a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
    /// Secret backend, `native` or an external engine such as `vault`
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(rename = "type", default)]
    pub scope: SecretScope,
    #[serde(default)]
    pub pull: SecretPull,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

/// Secret plugin run as a sidecar to provide secrets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub pull: PullPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<StepSecret>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

/// Secret mapped into a container, `source` name to `target` variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStepSecret")]
pub struct StepSecret {
    pub source: String,
    pub target: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStepSecret {
    Short(String),
    Full { source: String, target: String },
}

impl From<RawStepSecret> for StepSecret {
    fn from(raw: RawStepSecret) -> Self {
        match raw {
            RawStepSecret::Short(name) => Self {
                source: name.clone(),
                target: name,
            },
            RawStepSecret::Full { source, target } => Self { source, target },
        }
    }
}
