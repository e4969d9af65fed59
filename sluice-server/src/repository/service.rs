//! Service Repository
//!
//! Handles all database operations related to services.

use chrono::{DateTime, Utc};
use sluice_core::domain::Service;
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_status;

/// Insert a service
pub async fn create(pool: &PgPool, service: &Service) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO services (id, build_id, repo_id, number, name, image,
                              status, error, exit_code, created, started, finished)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(service.id)
    .bind(service.build_id)
    .bind(service.repo_id)
    .bind(service.number)
    .bind(&service.name)
    .bind(&service.image)
    .bind(service.status.as_str())
    .bind(&service.error)
    .bind(service.exit_code)
    .bind(service.created)
    .bind(service.started)
    .bind(service.finished)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist the mutable fields of a service; returns whether a row was updated
pub async fn update(pool: &PgPool, service: &Service) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE services
        SET status = $1, error = $2, exit_code = $3, started = $4, finished = $5
        WHERE id = $6
        "#,
    )
    .bind(service.status.as_str())
    .bind(&service.error)
    .bind(service.exit_code)
    .bind(service.started)
    .bind(service.finished)
    .bind(service.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Find services by build ID, in plan order
pub async fn find_by_build(pool: &PgPool, build_id: Uuid) -> Result<Vec<Service>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ServiceRow>(
        r#"
        SELECT id, build_id, repo_id, number, name, image,
               status, error, exit_code, created, started, finished
        FROM services
        WHERE build_id = $1
        ORDER BY number ASC
        "#,
    )
    .bind(build_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    build_id: Uuid,
    repo_id: Uuid,
    number: i32,
    name: String,
    image: String,
    status: String,
    error: Option<String>,
    exit_code: Option<i32>,
    created: DateTime<Utc>,
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            build_id: row.build_id,
            repo_id: row.repo_id,
            number: row.number,
            name: row.name,
            image: row.image,
            status: parse_status(&row.status),
            error: row.error,
            exit_code: row.exit_code,
            created: row.created,
            started: row.started,
            finished: row.finished,
        }
    }
}
