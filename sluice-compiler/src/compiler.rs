//! Pipeline compiler
//!
//! Parse, expand and validate a pipeline document.

use sluice_core::pipeline::{Container, Pipeline, RuleData, Template};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::CompileError;
use crate::expand::expand;
use crate::fetch::TemplateFetcher;

/// Default limit on nested template calls
pub const DEFAULT_MAX_TEMPLATE_DEPTH: usize = 5;

/// Compiles pipeline documents into resolved pipelines
///
/// Holds no per-build state, so a single compiler can be shared across
/// requests as long as its fetcher can.
#[derive(Clone)]
pub struct Compiler {
    fetcher: Arc<dyn TemplateFetcher>,
    max_template_depth: usize,
}

impl Compiler {
    pub fn new(fetcher: Arc<dyn TemplateFetcher>) -> Self {
        Self {
            fetcher,
            max_template_depth: DEFAULT_MAX_TEMPLATE_DEPTH,
        }
    }

    pub fn with_max_template_depth(mut self, max_template_depth: usize) -> Self {
        self.max_template_depth = max_template_depth;
        self
    }

    pub fn max_template_depth(&self) -> usize {
        self.max_template_depth
    }

    /// Parse a pipeline document
    pub fn parse(&self, document: &[u8]) -> Result<Pipeline, CompileError> {
        serde_yaml::from_slice(document).map_err(|e| CompileError::parse("pipeline", e))
    }

    /// Expand template calls using an explicit set of declarations
    pub async fn expand(
        &self,
        pipeline: Pipeline,
        templates: &BTreeMap<String, Template>,
        rules: &RuleData,
    ) -> Result<Pipeline, CompileError> {
        expand(
            self.fetcher.as_ref(),
            pipeline,
            templates,
            rules,
            self.max_template_depth,
        )
        .await
    }

    /// Parse, expand with the document's own declarations, then validate
    pub async fn compile(&self, document: &[u8], rules: &RuleData) -> Result<Pipeline, CompileError> {
        let pipeline = self.parse(document)?;
        let templates = pipeline.templates_by_name();

        let resolved = self.expand(pipeline, &templates, rules).await?;
        validate(&resolved)?;

        tracing::debug!(
            "Compiled pipeline: {} stages, {} steps, {} services, {} secrets",
            resolved.stages.len(),
            resolved.all_steps().count(),
            resolved.services.len(),
            resolved.secrets.len()
        );

        Ok(resolved)
    }
}

/// Structural checks on a resolved pipeline
pub fn validate(pipeline: &Pipeline) -> Result<(), CompileError> {
    if !pipeline.stages.is_empty() && !pipeline.steps.is_empty() {
        return Err(CompileError::Validation(
            "stages and steps are mutually exclusive".to_string(),
        ));
    }

    for stage in &pipeline.stages {
        if stage.name.is_empty() {
            return Err(CompileError::Validation("stage has no name".to_string()));
        }
    }

    for step in pipeline.all_steps() {
        validate_container("step", step)?;
    }

    for service in &pipeline.services {
        validate_container("service", service)?;
    }

    Ok(())
}

fn validate_container(kind: &str, container: &Container) -> Result<(), CompileError> {
    if container.name.is_empty() {
        return Err(CompileError::Validation(format!("{} has no name", kind)));
    }

    if container.image.is_empty() {
        return Err(CompileError::Validation(format!(
            "{} {} has no image",
            kind, container.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FileFetcher;

    fn compiler() -> Compiler {
        Compiler::new(Arc::new(FileFetcher::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/testdata"
        ))))
    }

    fn rules() -> RuleData {
        RuleData {
            branch: "main".to_string(),
            event: "push".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_compile_reads_templates_from_disk() {
        let document = br#"
version: "1"
environment:
  foo: test1
templates:
  - name: gradle
    source: gradle.yml
    type: file
    vars:
      image: openjdk:latest
      environment: "{ GRADLE_USER_HOME: .gradle }"
      pull_policy: "pull: true"
stages:
  build:
    steps:
      - name: sample
        template:
          name: gradle
  publish:
    needs: build
    steps:
      - name: upload
        image: alpine
        commands: echo done
"#;

        let resolved = compiler().compile(document, &rules()).await.unwrap();

        let names: Vec<&str> = resolved.all_steps().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["sample_install", "sample_test", "sample_build", "upload"]
        );
        assert_eq!(resolved.stages[1].needs, vec!["build"]);
        assert_eq!(resolved.environment.get("foo"), Some("test1"));
        assert_eq!(resolved.environment.get("star"), Some("test3"));
        assert!(resolved.templates.is_empty());
    }

    #[tokio::test]
    async fn test_compile_script_template_from_disk() {
        let document = br#"
templates:
  - name: golang
    source: template.lua
    type: file
    format: lua
    vars:
      commands: [go vet, go build]
steps:
  - name: sample
    template:
      name: golang
"#;

        let resolved = compiler().compile(document, &rules()).await.unwrap();

        assert_eq!(resolved.steps[0].name, "sample_build");
        assert_eq!(resolved.steps[0].commands, vec!["go vet", "go build"]);
    }

    #[tokio::test]
    async fn test_compile_rejects_stages_and_steps() {
        let document = b"stages:\n  a:\n    steps:\n      - name: x\n        image: alpine\nsteps:\n  - name: y\n    image: alpine\n";

        let result = compiler().compile(document, &rules()).await;
        assert!(matches!(result, Err(CompileError::Validation(_))));
    }

    #[tokio::test]
    async fn test_compile_rejects_step_without_image() {
        let result = compiler()
            .compile(b"steps:\n  - name: build\n", &rules())
            .await;

        assert!(matches!(result, Err(CompileError::Validation(msg)) if msg.contains("build")));
    }

    #[tokio::test]
    async fn test_compile_rejects_malformed_document() {
        let result = compiler().compile(b"steps: {", &rules()).await;
        assert!(matches!(result, Err(CompileError::Parse { what, .. }) if what == "pipeline"));
    }

    #[tokio::test]
    async fn test_max_template_depth_is_configurable() {
        let document = br#"
templates:
  - name: chain
    source: template_calls_template.yml
    type: file
steps:
  - name: sample
    template:
      name: chain
"#;

        let compiler = compiler().with_max_template_depth(1);
        assert_eq!(compiler.max_template_depth(), 1);

        let result = compiler.compile(document, &rules()).await;
        assert!(matches!(
            result,
            Err(CompileError::DepthExceeded { depth: 2, max: 1, .. })
        ));
    }
}
