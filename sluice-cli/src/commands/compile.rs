//! Compile and validate command handlers

use anyhow::{Context, Result};
use colored::*;
use sluice_compiler::Compiler;
use sluice_core::pipeline::{Pipeline, RuleData};

use crate::config::Config;

/// Compile a pipeline file and print the resolved pipeline
pub async fn compile_pipeline(
    config: &Config,
    path: &str,
    rules: RuleData,
    json: bool,
) -> Result<()> {
    let resolved = compile_file(&config.compiler(), path, &rules).await?;

    let output = if json {
        serde_json::to_string_pretty(&resolved)?
    } else {
        serde_yaml::to_string(&resolved)?
    };
    println!("{}", output);

    Ok(())
}

/// Compile a pipeline file and print a short summary
pub async fn validate_pipeline(config: &Config, path: &str, rules: RuleData) -> Result<()> {
    let resolved = compile_file(&config.compiler(), path, &rules).await?;

    println!("{}", "✓ Pipeline is valid".green().bold());
    for line in summary(&resolved) {
        println!("  {}", line);
    }

    Ok(())
}

async fn compile_file(compiler: &Compiler, path: &str, rules: &RuleData) -> Result<Pipeline> {
    let document =
        std::fs::read(path).with_context(|| format!("Failed to read pipeline file: {}", path))?;

    compiler
        .compile(&document, rules)
        .await
        .with_context(|| format!("Failed to compile {}", path))
}

fn summary(pipeline: &Pipeline) -> Vec<String> {
    let mut lines = Vec::new();

    if !pipeline.stages.is_empty() {
        lines.push(format!(
            "Stages:   {}",
            pipeline
                .stages
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    lines.push(format!(
        "Steps:    {}",
        pipeline
            .all_steps()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    lines.push(format!("Services: {}", pipeline.services.len()));
    lines.push(format!("Secrets:  {}", pipeline.secrets.len()));

    lines
}
