//! Script template format
//!
//! Lua evaluated in the `sluice-lua` sandbox. The returned table is
//! serialized to YAML so both formats feed the same fragment parser.

use sluice_core::pipeline::Value;
use sluice_lua::{
    DEFAULT_MEMORY_LIMIT, DEFAULT_TIME_LIMIT, LogLevel, LogModule, LogSink, ModuleRegistry, VarsModule,
    evaluate_template,
};
use std::collections::BTreeMap;

use crate::error::RenderError;

/// Forwards template `log.*` calls into the process log
pub struct TracingSink {
    template: String,
}

impl TracingSink {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl LogSink for TracingSink {
    fn write(&mut self, level: LogLevel, message: &str) {
        let template = self.template.as_str();
        match level {
            LogLevel::Debug => tracing::debug!(template, "{}", message),
            LogLevel::Info => tracing::info!(template, "{}", message),
            LogLevel::Warning => tracing::warn!(template, "{}", message),
            LogLevel::Error => tracing::error!(template, "{}", message),
        }
    }
}

/// Modules loaded into every template sandbox
pub fn modules(vars: BTreeMap<String, Value>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(VarsModule::new(vars));
    registry.register(LogModule::new(TracingSink::new("script")));
    registry
}

/// Evaluate a script template and serialize its table as YAML
pub fn render(text: &str, vars: &BTreeMap<String, Value>) -> Result<String, RenderError> {
    let registry = modules(vars.clone());

    let mut fragment = evaluate_template(text, &registry, DEFAULT_MEMORY_LIMIT, DEFAULT_TIME_LIMIT)
        .map_err(|e| RenderError::Script(format!("{:#}", e)))?;
    empty_tables_to_lists(&mut fragment);

    serde_yaml::to_string(&fragment).map_err(|e| RenderError::Output(e.to_string()))
}

/// Fragment keys whose values are maps; every other key holding an empty
/// table is a list
const MAP_KEYS: [&str; 8] = [
    "environment",
    "metadata",
    "parameters",
    "ruleset",
    "if",
    "unless",
    "template",
    "vars",
];

/// Lua cannot tell an empty list from an empty map, so `commands = {}`
/// comes back as `{}` at any depth.
fn empty_tables_to_lists(fragment: &mut serde_json::Value) {
    if let Some(map) = fragment.as_object_mut() {
        for (key, value) in map.iter_mut() {
            normalize(key, value);
        }
    }
}

fn normalize(key: &str, value: &mut serde_json::Value) {
    use serde_json::Value;

    if value.as_object().is_some_and(|map| map.is_empty()) {
        if !MAP_KEYS.contains(&key) {
            *value = Value::Array(Vec::new());
        }
        return;
    }

    match value {
        Value::Object(map) => {
            for (child, nested) in map.iter_mut() {
                normalize(child, nested);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Some(map) = item.as_object_mut() {
                    for (child, nested) in map.iter_mut() {
                        normalize(child, nested);
                    }
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::pipeline::Fragment;

    #[test]
    fn test_script_output_parses_as_fragment() {
        let source = r#"
            log.info("rendering go template")
            return {
                environment = { star = "test3", bar = "test4" },
                steps = {
                    {
                        name = "build",
                        image = vars.get("image", "golang:latest"),
                        pull = "not_present",
                        commands = { "go build", "go test" },
                    },
                },
            }
        "#;

        let yaml = render(source, &BTreeMap::new()).unwrap();
        let fragment: Fragment = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(fragment.environment.get("star"), Some("test3"));
        assert_eq!(fragment.steps.len(), 1);
        assert_eq!(fragment.steps[0].image, "golang:latest");
        assert_eq!(fragment.steps[0].commands, vec!["go build", "go test"]);
    }

    #[test]
    fn test_empty_step_table_is_an_empty_list() {
        let yaml = render(r#"return { steps = {}, environment = {} }"#, &BTreeMap::new()).unwrap();
        let fragment: Fragment = serde_yaml::from_str(&yaml).unwrap();

        assert!(fragment.steps.is_empty());
        assert!(fragment.environment.is_empty());
    }

    #[test]
    fn test_nested_empty_tables_are_empty_lists() {
        let source = r#"
            return {
                steps = {
                    {
                        name = "build",
                        image = "golang:latest",
                        commands = vars.get("commands", {}),
                        template = { name = "go", vars = {} },
                    },
                },
                secrets = {
                    {
                        name = "vault_token",
                        origin = { name = "vault", image = "vault:latest", secrets = {}, parameters = {} },
                    },
                },
            }
        "#;

        let yaml = render(source, &BTreeMap::new()).unwrap();
        let fragment: Fragment = serde_yaml::from_str(&yaml).unwrap();

        assert!(fragment.steps[0].commands.is_empty());
        let call = fragment.steps[0].template.as_ref().unwrap();
        assert!(call.vars.is_empty());
        let origin = fragment.secrets[0].origin.as_ref().unwrap();
        assert!(origin.secrets.is_empty());
        assert!(origin.parameters.is_empty());
    }

    #[test]
    fn test_script_error_is_render_error() {
        let result = render(r#"return vars.require("image")"#, &BTreeMap::new());
        assert!(matches!(result, Err(RenderError::Script(msg)) if msg.contains("image")));
    }

    #[test]
    fn test_template_modules_stubs() {
        let stubs = modules(BTreeMap::new()).generate_stubs();
        assert!(stubs.contains("function vars.get"));
        assert!(stubs.contains("function log.info"));
    }
}
