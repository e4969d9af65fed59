//! Template expansion
//!
//! Replaces every step that calls a template with the steps the template
//! emits, recursively, until the pipeline no longer references templates.
//! Secrets, services and environment contributed by templates are gathered
//! into the resolved pipeline.
//!
//! The expansion stack and accumulators live for one [`expand`] call only.

use futures::FutureExt;
use futures::future::BoxFuture;
use sluice_core::pipeline::{
    Container, Environment, Fragment, Pipeline, RuleData, Secret, Template, TemplateCall,
    templates_by_name,
};
use std::collections::BTreeMap;

use crate::error::CompileError;
use crate::fetch::TemplateFetcher;
use crate::render::render;
use crate::rules;

/// Expand every template call in `pipeline`
///
/// `templates` is the set of declarations visible to the pipeline's own
/// steps. Steps whose ruleset does not match `rules` are dropped before
/// their template is ever fetched. Any error aborts the whole expansion.
pub async fn expand(
    fetcher: &dyn TemplateFetcher,
    mut pipeline: Pipeline,
    templates: &BTreeMap<String, Template>,
    rules: &RuleData,
    max_depth: usize,
) -> Result<Pipeline, CompileError> {
    let mut expansion = Expansion {
        fetcher,
        rules,
        max_depth,
        stack: Vec::new(),
        secrets: std::mem::take(&mut pipeline.secrets),
        services: std::mem::take(&mut pipeline.services),
        environment: std::mem::take(&mut pipeline.environment),
    };

    for stage in pipeline.stages.iter_mut() {
        let steps = std::mem::take(&mut stage.steps);
        stage.steps = expansion.expand_steps(steps, templates).await?;
    }

    let steps = std::mem::take(&mut pipeline.steps);
    pipeline.steps = expansion.expand_steps(steps, templates).await?;

    pipeline.secrets = expansion.secrets;
    pipeline.services = expansion.services;
    pipeline.environment = expansion.environment;
    pipeline.templates.clear();

    Ok(pipeline)
}

struct Expansion<'a> {
    fetcher: &'a dyn TemplateFetcher,
    rules: &'a RuleData,
    max_depth: usize,
    /// `(name, source)` of every template currently being expanded
    stack: Vec<(String, String)>,
    secrets: Vec<Secret>,
    services: Vec<Container>,
    environment: Environment,
}

impl<'a> Expansion<'a> {
    fn expand_steps<'b>(
        &'b mut self,
        steps: Vec<Container>,
        templates: &'b BTreeMap<String, Template>,
    ) -> BoxFuture<'b, Result<Vec<Container>, CompileError>> {
        async move {
            let mut resolved = Vec::with_capacity(steps.len());

            for step in steps {
                if !rules::matches(&step.ruleset, self.rules) {
                    tracing::debug!("Skipping step {}: ruleset does not match", step.name);
                    continue;
                }

                match step.template.clone() {
                    None => resolved.push(step),
                    Some(call) => {
                        let emitted = self.expand_call(&step.name, &call, templates).await?;
                        resolved.extend(emitted);
                    }
                }
            }

            Ok(resolved)
        }
        .boxed()
    }

    async fn expand_call(
        &mut self,
        caller: &str,
        call: &TemplateCall,
        templates: &BTreeMap<String, Template>,
    ) -> Result<Vec<Container>, CompileError> {
        let template = templates
            .get(&call.name)
            .ok_or_else(|| CompileError::TemplateNotFound(call.name.clone()))?;

        let identity = template.identity();
        if self.stack.contains(&identity) {
            return Err(CompileError::CircularReference {
                name: template.name.clone(),
                locator: template.source.clone(),
            });
        }

        self.stack.push(identity);
        let result = self.expand_template(caller, call, template, templates).await;
        self.stack.pop();

        result
    }

    async fn expand_template(
        &mut self,
        caller: &str,
        call: &TemplateCall,
        template: &Template,
        templates: &BTreeMap<String, Template>,
    ) -> Result<Vec<Container>, CompileError> {
        if self.stack.len() > self.max_depth {
            return Err(CompileError::DepthExceeded {
                name: template.name.clone(),
                depth: self.stack.len(),
                max: self.max_depth,
            });
        }

        tracing::debug!(
            "Expanding template {} ({}) for step {}",
            template.name,
            template.source,
            caller
        );

        let vars = template.variables(&call.vars);

        let raw = self
            .fetcher
            .fetch(template)
            .await
            .map_err(|source| CompileError::Fetch {
                name: template.name.clone(),
                source,
            })?;

        let text = render(&raw, template.format, &vars).map_err(|source| CompileError::Render {
            name: template.name.clone(),
            source,
        })?;

        let fragment: Fragment = serde_yaml::from_str(&text)
            .map_err(|e| CompileError::parse(format!("template {}", template.name), e))?;

        if fragment.metadata.render_inline {
            return Err(CompileError::UnsupportedInlineRender(template.name.clone()));
        }

        // The template's own contributions land before those of templates it calls
        self.secrets.extend(fragment.secrets);
        self.services.extend(fragment.services);
        self.environment.merge_missing(&fragment.environment);

        let steps = fragment
            .steps
            .into_iter()
            .map(|mut step| {
                step.name = format!("{}_{}", caller, step.name);
                step
            })
            .collect();

        let mut scope = templates.clone();
        scope.extend(templates_by_name(&fragment.templates));

        self.expand_steps(steps, &scope).await
    }
}
