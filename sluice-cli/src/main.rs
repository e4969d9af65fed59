//! Sluice CLI
//!
//! Compiles, validates and renders pipeline documents locally, using the
//! same compiler the server runs.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, ScmConfig};
use sluice_compiler::DEFAULT_MAX_TEMPLATE_DEPTH;

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Sluice pipeline compiler", long_about = None)]
struct Cli {
    /// Directory `file` and `remote` templates are read from
    #[arg(long, env = "SLUICE_TEMPLATE_DIR", default_value = "./templates")]
    templates_dir: String,

    /// Limit on nested template calls
    #[arg(long, env = "SLUICE_MAX_TEMPLATE_DEPTH", default_value_t = DEFAULT_MAX_TEMPLATE_DEPTH)]
    max_template_depth: usize,

    /// Source-control host to fetch templates from instead of the directory
    #[arg(long, env = "SLUICE_SCM_URL")]
    scm_url: Option<String>,

    /// Token sent to the source-control host
    #[arg(long, env = "SLUICE_SCM_TOKEN", hide_env_values = true)]
    scm_token: Option<String>,

    /// Organization owning the pipeline's repository
    #[arg(long, default_value = "")]
    org: String,

    /// Repository the pipeline belongs to
    #[arg(long, default_value = "")]
    repo: String,

    /// Commit `file` templates are read at
    #[arg(long, default_value = "HEAD")]
    commit: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_compiler=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config {
        templates_dir: cli.templates_dir,
        max_template_depth: cli.max_template_depth,
        scm: cli.scm_url.map(|url| ScmConfig {
            url,
            token: cli.scm_token,
            org: cli.org,
            repo: cli.repo,
            commit: cli.commit,
        }),
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
