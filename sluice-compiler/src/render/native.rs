//! Native template format
//!
//! YAML text with `{{ .name }}` or `{{ .a.b }}` placeholders. Each
//! placeholder is replaced by the display form of the variable: scalars as
//! plain text, lists and maps as JSON flow text.

use regex::Regex;
use sluice_core::pipeline::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::RenderError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{-?\s*\.([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*-?\}\}")
        .expect("placeholder pattern is valid")
});

/// Substitute every placeholder in `text`
pub fn render(text: &str, vars: &BTreeMap<String, Value>) -> Result<String, RenderError> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let value = resolve(vars, path.as_str())
            .ok_or_else(|| RenderError::MissingVariable(path.as_str().to_string()))?;

        output.push_str(&text[last..whole.start()]);
        output.push_str(&value.to_string());
        last = whole.end();
    }

    output.push_str(&text[last..]);
    Ok(output)
}

fn resolve<'a>(vars: &'a BTreeMap<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let root = vars.get(segments.next()?)?;
    let rest: Vec<&str> = segments.collect();
    root.lookup(&rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> BTreeMap<String, Value> {
        let mut vars = BTreeMap::new();
        vars.insert("image".to_string(), Value::from("openjdk:latest"));
        vars.insert(
            "environment".to_string(),
            Value::from("{ GRADLE_USER_HOME: .gradle }"),
        );
        vars.insert("pull_policy".to_string(), Value::from("pull: true"));
        vars.insert(
            "build".to_string(),
            serde_yaml::from_str("tool: gradle\nflags: [--info, --stacktrace]\n").unwrap(),
        );
        vars
    }

    #[test]
    fn test_substitutes_scalars_verbatim() {
        let text = "image: {{ .image }}\n{{ .pull_policy }}\nenvironment: {{.environment}}\n";
        let rendered = render(text, &vars()).unwrap();

        assert_eq!(
            rendered,
            "image: openjdk:latest\npull: true\nenvironment: { GRADLE_USER_HOME: .gradle }\n"
        );
    }

    #[test]
    fn test_nested_paths_and_collections() {
        let text = "tool: {{ .build.tool }}\nflags: {{ .build.flags }}\n";
        let rendered = render(text, &vars()).unwrap();

        assert_eq!(
            rendered,
            "tool: gradle\nflags: [\"--info\",\"--stacktrace\"]\n"
        );
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let result = render("image: {{ .nope }}\n", &vars());
        assert!(matches!(result, Err(RenderError::MissingVariable(name)) if name == "nope"));

        let result = render("image: {{ .image.tag }}\n", &vars());
        assert!(matches!(result, Err(RenderError::MissingVariable(name)) if name == "image.tag"));
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let text = "steps:\n  - name: test\n    commands: [\"echo {{ not a var }}\"]\n";
        assert_eq!(render(text, &BTreeMap::new()).unwrap(), text);
    }
}
