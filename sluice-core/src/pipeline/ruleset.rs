//! Conditional inclusion rules
//!
//! Only the data model lives here. Evaluation is done by the compiler.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::one_or_many;

/// How patterns are compared against build metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Matcher {
    /// Shell-style globs where `*` does not cross `/`
    #[default]
    Filepath,
    Regexp,
}

/// How the categories of one side of a ruleset are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    And,
    Or,
}

/// Patterns grouped by metadata category
///
/// Each category accepts a single string or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub branch: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub comment: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub event: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub repo: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub label: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub instance: Vec<String>,
}

impl Rules {
    pub fn is_empty(&self) -> bool {
        self.branch.is_empty()
            && self.comment.is_empty()
            && self.event.is_empty()
            && self.path.is_empty()
            && self.repo.is_empty()
            && self.status.is_empty()
            && self.tag.is_empty()
            && self.target.is_empty()
            && self.label.is_empty()
            && self.instance.is_empty()
    }

    /// Append every pattern of `other` to the matching category
    pub fn extend(&mut self, other: Rules) {
        self.branch.extend(other.branch);
        self.comment.extend(other.comment);
        self.event.extend(other.event);
        self.path.extend(other.path);
        self.repo.extend(other.repo);
        self.status.extend(other.status);
        self.tag.extend(other.tag);
        self.target.extend(other.target);
        self.label.extend(other.label);
        self.instance.extend(other.instance);
    }
}

/// Allow-set (`if`) and deny-set (`unless`) for one container
///
/// Category keys written directly under `ruleset:` are shorthand for `if:`
/// and are merged into it when both are present. Any other key is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRuleset")]
pub struct Ruleset {
    #[serde(rename = "if", skip_serializing_if = "Rules::is_empty")]
    pub allow: Rules,
    #[serde(skip_serializing_if = "Rules::is_empty")]
    pub unless: Rules,
    pub matcher: Matcher,
    pub operator: Operator,
}

impl Ruleset {
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.unless.is_empty()
    }
}

#[derive(Deserialize)]
struct RawRuleset {
    #[serde(rename = "if", default)]
    allow: Rules,
    #[serde(default)]
    unless: Rules,
    #[serde(default)]
    matcher: Matcher,
    #[serde(default)]
    operator: Operator,
    // Declared before `unknown` so category keys are claimed first
    #[serde(flatten)]
    shorthand: Rules,
    #[serde(flatten)]
    unknown: BTreeMap<String, IgnoredAny>,
}

impl TryFrom<RawRuleset> for Ruleset {
    type Error = String;

    fn try_from(raw: RawRuleset) -> Result<Self, Self::Error> {
        if !raw.unknown.is_empty() {
            let keys: Vec<&str> = raw.unknown.keys().map(String::as_str).collect();
            return Err(format!("unknown ruleset key(s): {}", keys.join(", ")));
        }

        let mut allow = raw.allow;
        allow.extend(raw.shorthand);

        Ok(Self {
            allow,
            unless: raw.unless,
            matcher: raw.matcher,
            operator: raw.operator,
        })
    }
}

/// Build metadata rulesets are evaluated against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleData {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub event: String,
    /// Files changed by the build's commit range
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub label: Vec<String>,
    #[serde(default)]
    pub instance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_means_if() {
        let ruleset: Ruleset = serde_yaml::from_str("branch: main\nevent: [push, tag]\n").unwrap();

        assert_eq!(ruleset.allow.branch, vec!["main"]);
        assert_eq!(ruleset.allow.event, vec!["push", "tag"]);
        assert!(ruleset.unless.is_empty());
    }

    #[test]
    fn test_explicit_sides_and_options() {
        let ruleset: Ruleset = serde_yaml::from_str(
            r#"
if:
  branch: [main, "release/*"]
unless:
  event: pull_request
matcher: regexp
operator: or
"#,
        )
        .unwrap();

        assert_eq!(ruleset.allow.branch, vec!["main", "release/*"]);
        assert_eq!(ruleset.unless.event, vec!["pull_request"]);
        assert_eq!(ruleset.matcher, Matcher::Regexp);
        assert_eq!(ruleset.operator, Operator::Or);
    }

    #[test]
    fn test_shorthand_merges_with_if() {
        let ruleset: Ruleset = serde_yaml::from_str(
            r#"
if:
  branch: main
event: push
branch: "release/*"
"#,
        )
        .unwrap();

        assert_eq!(ruleset.allow.branch, vec!["main", "release/*"]);
        assert_eq!(ruleset.allow.event, vec!["push"]);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result: Result<Ruleset, _> = serde_yaml::from_str("branch: main
brnch: dev
");

        let err = result.unwrap_err().to_string();
        assert!(err.contains("brnch"), "{}", err);
    }

    #[test]
    fn test_default_ruleset_is_empty() {
        let ruleset = Ruleset::default();
        assert!(ruleset.is_empty());
        assert_eq!(ruleset.matcher, Matcher::Filepath);
        assert_eq!(ruleset.operator, Operator::And);
    }
}
