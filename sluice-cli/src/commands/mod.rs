//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod compile;
mod template;

pub use template::TemplateCommands;

use anyhow::Result;
use clap::{Args, Subcommand};
use sluice_core::pipeline::RuleData;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every template call and print the resulting pipeline
    Compile {
        /// Path to the pipeline document
        file: String,

        #[command(flatten)]
        rules: RuleArgs,

        /// Print JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Compile a pipeline and report whether it is valid
    Validate {
        /// Path to the pipeline document
        file: String,

        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Template authoring helpers
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
}

/// Build facts step rulesets are evaluated against
#[derive(Args, Debug, Default)]
pub struct RuleArgs {
    #[arg(long, default_value = "main")]
    branch: String,

    #[arg(long, default_value = "push")]
    event: String,

    #[arg(long, default_value = "")]
    tag: String,

    #[arg(long, default_value = "")]
    target: String,

    #[arg(long, default_value = "")]
    comment: String,

    #[arg(long, default_value = "")]
    status: String,

    #[arg(long, default_value = "")]
    repo_name: String,

    #[arg(long, default_value = "")]
    instance: String,

    /// Changed file (repeatable)
    #[arg(long)]
    path: Vec<String>,

    /// Pull request label (repeatable)
    #[arg(long)]
    label: Vec<String>,
}

impl From<RuleArgs> for RuleData {
    fn from(args: RuleArgs) -> Self {
        RuleData {
            branch: args.branch,
            comment: args.comment,
            event: args.event,
            path: args.path,
            repo: args.repo_name,
            status: args.status,
            tag: args.tag,
            target: args.target,
            label: args.label,
            instance: args.instance,
        }
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Compile { file, rules, json } => {
            compile::compile_pipeline(config, &file, rules.into(), json).await
        }
        Commands::Validate { file, rules } => {
            compile::validate_pipeline(config, &file, rules.into()).await
        }
        Commands::Template { command } => template::handle_template_command(command).await,
    }
}
