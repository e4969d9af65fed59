//! Step Repository
//!
//! Handles all database operations related to steps.

use chrono::{DateTime, Utc};
use sluice_core::domain::Step;
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_status;

/// Insert a step
pub async fn create(pool: &PgPool, step: &Step) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO steps (id, build_id, repo_id, number, name, image, stage,
                           status, error, exit_code, created, started, finished)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(step.id)
    .bind(step.build_id)
    .bind(step.repo_id)
    .bind(step.number)
    .bind(&step.name)
    .bind(&step.image)
    .bind(&step.stage)
    .bind(step.status.as_str())
    .bind(&step.error)
    .bind(step.exit_code)
    .bind(step.created)
    .bind(step.started)
    .bind(step.finished)
    .execute(pool)
    .await?;

    Ok(())
}

/// Count steps grouped by status
pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*)
        FROM steps
        GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Persist the mutable fields of a step; returns whether a row was updated
pub async fn update(pool: &PgPool, step: &Step) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE steps
        SET status = $1, error = $2, exit_code = $3, started = $4, finished = $5
        WHERE id = $6
        "#,
    )
    .bind(step.status.as_str())
    .bind(&step.error)
    .bind(step.exit_code)
    .bind(step.started)
    .bind(step.finished)
    .bind(step.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Find steps by build ID, in plan order
pub async fn find_by_build(pool: &PgPool, build_id: Uuid) -> Result<Vec<Step>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StepRow>(
        r#"
        SELECT id, build_id, repo_id, number, name, image, stage,
               status, error, exit_code, created, started, finished
        FROM steps
        WHERE build_id = $1
        ORDER BY number ASC
        "#,
    )
    .bind(build_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Find a step of a build by its number
pub async fn find_by_number(
    pool: &PgPool,
    build_id: Uuid,
    number: i32,
) -> Result<Option<Step>, sqlx::Error> {
    let row = sqlx::query_as::<_, StepRow>(
        r#"
        SELECT id, build_id, repo_id, number, name, image, stage,
               status, error, exit_code, created, started, finished
        FROM steps
        WHERE build_id = $1 AND number = $2
        "#,
    )
    .bind(build_id)
    .bind(number)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct StepRow {
    id: Uuid,
    build_id: Uuid,
    repo_id: Uuid,
    number: i32,
    name: String,
    image: String,
    stage: String,
    status: String,
    error: Option<String>,
    exit_code: Option<i32>,
    created: DateTime<Utc>,
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
}

impl From<StepRow> for Step {
    fn from(row: StepRow) -> Self {
        Step {
            id: row.id,
            build_id: row.build_id,
            repo_id: row.repo_id,
            number: row.number,
            name: row.name,
            image: row.image,
            stage: row.stage,
            status: parse_status(&row.status),
            error: row.error,
            exit_code: row.exit_code,
            created: row.created,
            started: row.started,
            finished: row.finished,
        }
    }
}
