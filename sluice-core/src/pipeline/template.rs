//! Template declarations and template calls

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Value;

/// Where template bytes are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// A path inside the repository being built, at the build's commit
    File,
    /// A `host/org/repo/path[@ref]` locator on the source-control host
    #[default]
    #[serde(alias = "github", alias = "scm")]
    Remote,
}

/// How template bytes are turned into a pipeline fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// YAML with `{{ .var }}` placeholders
    #[default]
    #[serde(alias = "go", alias = "golang")]
    Native,
    /// Lua script returning the fragment as a table
    #[serde(alias = "lua")]
    Script,
}

/// Template declared in the `templates:` section of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub source: String,
    #[serde(rename = "type", default)]
    pub driver: Driver,
    #[serde(default)]
    pub format: Format,
    /// Default variables, overridden by the calling step's `vars`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, Value>,
}

impl Template {
    /// Identity used to detect a template expanding itself
    pub fn identity(&self) -> (String, String) {
        (self.name.clone(), self.source.clone())
    }

    /// Declared defaults with `overrides` applied on top
    pub fn variables(&self, overrides: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        let mut vars = self.vars.clone();
        for (key, value) in overrides {
            vars.insert(key.clone(), value.clone());
        }
        vars
    }
}

/// Template invocation attached to a step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, Value>,
}
