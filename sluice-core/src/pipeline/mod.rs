//! Pipeline document types
//!
//! The YAML pipeline a repository declares, the pieces templates produce,
//! and the resolved pipeline the compiler hands to the planner. A resolved
//! pipeline uses the same [`Pipeline`] type with every template call
//! replaced by the steps it produced.

pub mod environment;
pub mod fragment;
pub mod ruleset;
pub mod secret;
pub mod template;
pub mod value;

pub use environment::Environment;
pub use fragment::{Fragment, FragmentMetadata};
pub use ruleset::{Matcher, Operator, RuleData, Rules, Ruleset};
pub use secret::{Origin, Secret, SecretPull, SecretScope, StepSecret};
pub use template::{Driver, Format, Template, TemplateCall};
pub use value::Value;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Image pull policy of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PullPolicy {
    Always,
    #[default]
    NotPresent,
    OnStart,
    Never,
}

impl<'de> Deserialize<'de> for PullPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPull {
            Flag(bool),
            Name(String),
        }

        match Option::<RawPull>::deserialize(deserializer)? {
            None => Ok(PullPolicy::default()),
            Some(RawPull::Flag(true)) => Ok(PullPolicy::Always),
            Some(RawPull::Flag(false)) => Ok(PullPolicy::NotPresent),
            Some(RawPull::Name(name)) => match name.as_str() {
                "always" | "true" => Ok(PullPolicy::Always),
                "not_present" | "false" | "" => Ok(PullPolicy::NotPresent),
                "on_start" => Ok(PullPolicy::OnStart),
                "never" => Ok(PullPolicy::Never),
                other => Err(serde::de::Error::custom(format!(
                    "unknown pull policy: {}",
                    other
                ))),
            },
        }
    }
}

/// A step or a service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub pull: PullPolicy,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Environment::is_empty")]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Ruleset::is_empty")]
    pub ruleset: Ruleset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateCall>,
}

/// Named group of steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    #[serde(default)]
    pub steps: Vec<Container>,
}

/// Pipeline document
///
/// `stages` and `steps` are mutually exclusive; the compiler rejects a
/// document that sets both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Environment::is_empty")]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<Template>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Container>,
    #[serde(default, deserialize_with = "stages", skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Container>,
}

impl Pipeline {
    /// Declared templates keyed by name; later declarations win
    pub fn templates_by_name(&self) -> BTreeMap<String, Template> {
        templates_by_name(&self.templates)
    }

    /// Every step in traversal order: stage steps first, then top-level steps
    pub fn all_steps(&self) -> impl Iterator<Item = &Container> {
        self.stages
            .iter()
            .flat_map(|stage| stage.steps.iter())
            .chain(self.steps.iter())
    }
}

/// Keys templates by name; later declarations win
pub fn templates_by_name(templates: &[Template]) -> BTreeMap<String, Template> {
    templates
        .iter()
        .map(|t| (t.name.clone(), t.clone()))
        .collect()
}

/// Accepts a single string or a list of strings
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

/// Accepts stages as a list or as a map keyed by stage name (document order kept)
fn stages<'de, D>(deserializer: D) -> Result<Vec<Stage>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct StageBody {
        #[serde(default, deserialize_with = "one_or_many")]
        needs: Vec<String>,
        #[serde(default)]
        steps: Vec<Container>,
    }

    struct StagesVisitor;

    impl<'de> Visitor<'de> for StagesVisitor {
        type Value = Vec<Stage>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of stages or a map of stage name to stage")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut stages = Vec::new();
            while let Some(stage) = seq.next_element::<Stage>()? {
                stages.push(stage);
            }
            Ok(stages)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut stages = Vec::new();
            while let Some((name, body)) = map.next_entry::<String, StageBody>()? {
                stages.push(Stage {
                    name,
                    needs: body.needs,
                    steps: body.steps,
                });
            }
            Ok(stages)
        }
    }

    deserializer.deserialize_any(StagesVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_as_ordered_map() {
        let pipeline: Pipeline = serde_yaml::from_str(
            r#"
version: "1"
stages:
  test:
    steps:
      - name: unit
        image: golang:latest
        commands: go test ./...
  build:
    needs: test
    steps:
      - name: compile
        image: golang:latest
        commands: [go build]
"#,
        )
        .unwrap();

        let names: Vec<&str> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["test", "build"]);
        assert_eq!(pipeline.stages[1].needs, vec!["test"]);
        assert_eq!(pipeline.stages[0].steps[0].commands, vec!["go test ./..."]);
    }

    #[test]
    fn test_stages_as_list() {
        let pipeline: Pipeline = serde_yaml::from_str(
            r#"
stages:
  - name: foo
    steps:
      - name: sample
        template:
          name: gradle
          vars:
            image: openjdk:latest
"#,
        )
        .unwrap();

        assert_eq!(pipeline.stages[0].name, "foo");
        let call = pipeline.stages[0].steps[0].template.as_ref().unwrap();
        assert_eq!(call.name, "gradle");
        assert_eq!(call.vars["image"], Value::from("openjdk:latest"));
    }

    #[test]
    fn test_pull_policy_values() {
        let parse = |s: &str| serde_yaml::from_str::<PullPolicy>(s);

        assert_eq!(parse("true").unwrap(), PullPolicy::Always);
        assert_eq!(parse("false").unwrap(), PullPolicy::NotPresent);
        assert_eq!(parse("always").unwrap(), PullPolicy::Always);
        assert_eq!(parse("on_start").unwrap(), PullPolicy::OnStart);
        assert_eq!(parse("never").unwrap(), PullPolicy::Never);
        assert!(parse("sometimes").is_err());

        let container: Container = serde_yaml::from_str("name: a\nimage: b\n").unwrap();
        assert_eq!(container.pull, PullPolicy::NotPresent);
    }

    #[test]
    fn test_all_steps_traversal_order() {
        let pipeline = Pipeline {
            stages: vec![Stage {
                name: "foo".to_string(),
                needs: vec![],
                steps: vec![
                    Container {
                        name: "one".to_string(),
                        ..Default::default()
                    },
                    Container {
                        name: "two".to_string(),
                        ..Default::default()
                    },
                ],
            }],
            steps: vec![Container {
                name: "three".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let names: Vec<&str> = pipeline.all_steps().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }
}
