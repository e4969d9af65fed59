use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create builds table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS builds (
            id UUID PRIMARY KEY,
            repo_id UUID NOT NULL,
            number BIGINT NOT NULL,
            org VARCHAR(255) NOT NULL,
            repo VARCHAR(255) NOT NULL,
            commit_sha VARCHAR(255) NOT NULL,
            branch VARCHAR(255) NOT NULL,
            event VARCHAR(50) NOT NULL,
            tag VARCHAR(255),
            target VARCHAR(255),
            status VARCHAR(50) NOT NULL,
            error TEXT,
            created TIMESTAMPTZ NOT NULL,
            enqueued TIMESTAMPTZ,
            started TIMESTAMPTZ,
            finished TIMESTAMPTZ,
            UNIQUE (repo_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create steps table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS steps (
            id UUID PRIMARY KEY,
            build_id UUID NOT NULL REFERENCES builds(id) ON DELETE CASCADE,
            repo_id UUID NOT NULL,
            number INTEGER NOT NULL,
            name VARCHAR(255) NOT NULL,
            image VARCHAR(512) NOT NULL,
            stage VARCHAR(255) NOT NULL DEFAULT '',
            status VARCHAR(50) NOT NULL,
            error TEXT,
            exit_code INTEGER,
            created TIMESTAMPTZ NOT NULL,
            started TIMESTAMPTZ,
            finished TIMESTAMPTZ,
            UNIQUE (build_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create services table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id UUID PRIMARY KEY,
            build_id UUID NOT NULL REFERENCES builds(id) ON DELETE CASCADE,
            repo_id UUID NOT NULL,
            number INTEGER NOT NULL,
            name VARCHAR(255) NOT NULL,
            image VARCHAR(512) NOT NULL,
            status VARCHAR(50) NOT NULL,
            error TEXT,
            exit_code INTEGER,
            created TIMESTAMPTZ NOT NULL,
            started TIMESTAMPTZ,
            finished TIMESTAMPTZ,
            UNIQUE (build_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create logs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            id UUID PRIMARY KEY,
            build_id UUID NOT NULL REFERENCES builds(id) ON DELETE CASCADE,
            repo_id UUID NOT NULL,
            step_id UUID REFERENCES steps(id) ON DELETE CASCADE,
            service_id UUID REFERENCES services(id) ON DELETE CASCADE,
            data TEXT NOT NULL DEFAULT '',
            created TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_builds_status ON builds(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_build_id ON logs(build_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
