//! Log Repository
//!
//! Handles all database operations related to step and service logs.

use sluice_core::domain::Log;
use sqlx::PgPool;

/// Insert a log record
pub async fn create(pool: &PgPool, log: &Log) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO logs (id, build_id, repo_id, step_id, service_id, data, created)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(log.id)
    .bind(log.build_id)
    .bind(log.repo_id)
    .bind(log.step_id)
    .bind(log.service_id)
    .bind(&log.data)
    .bind(log.created)
    .execute(pool)
    .await?;

    Ok(())
}
