use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod database;
pub mod db;
pub mod queue;
pub mod repository;
pub mod service;

use crate::config::Config;
use crate::database::{Database, MemoryDatabase, PgDatabase};
use crate::queue::ChannelQueue;
use crate::service::pipeline::{Compilers, TemplateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sluice server...");

    let config = Config::from_env()?;
    config.validate()?;

    let db: Arc<dyn Database> = if config.uses_memory_database() {
        tracing::warn!("Using the in-memory database; builds are lost on restart");
        Arc::new(MemoryDatabase::new())
    } else {
        tracing::info!("Connecting to database...");

        // Create database connection pool
        let pool = db::create_pool(&config.database_url)
            .await
            .context("Failed to create database pool")?;

        tracing::info!("Database connection pool created");

        // Run migrations
        db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Arc::new(PgDatabase::new(pool))
    };

    let store = match &config.scm_url {
        Some(url) => {
            tracing::info!("Fetching templates from {}", url);
            TemplateStore::Scm(sluice_scm::ScmClient::new(url, config.scm_token.clone()))
        }
        None => {
            tracing::info!("Reading templates from {}", config.template_dir);
            TemplateStore::Directory(PathBuf::from(&config.template_dir))
        }
    };

    let state = api::AppState {
        db,
        queue: Arc::new(ChannelQueue::new(config.queue_capacity)),
        compilers: Compilers::new(store, config.max_template_depth),
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
