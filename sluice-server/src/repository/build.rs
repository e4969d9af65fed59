//! Build Repository
//!
//! Handles all database operations related to builds.

use chrono::{DateTime, Utc};
use sluice_core::domain::Build;
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_status;

/// Insert a build, assigning the next number for its repository
pub async fn create(pool: &PgPool, build: &Build) -> Result<Build, sqlx::Error> {
    let row = sqlx::query_as::<_, BuildRow>(
        r#"
        INSERT INTO builds (id, repo_id, number, org, repo, commit_sha, branch, event,
                            tag, target, status, error, created, enqueued, started, finished)
        SELECT $1, $2, COALESCE(MAX(number), 0) + 1, $3, $4, $5, $6, $7,
               $8, $9, $10, $11, $12, $13, $14, $15
        FROM builds
        WHERE repo_id = $2
        RETURNING id, repo_id, number, org, repo, commit_sha, branch, event,
                  tag, target, status, error, created, enqueued, started, finished
        "#,
    )
    .bind(build.id)
    .bind(build.repo_id)
    .bind(&build.org)
    .bind(&build.repo)
    .bind(&build.commit)
    .bind(&build.branch)
    .bind(&build.event)
    .bind(&build.tag)
    .bind(&build.target)
    .bind(build.status.as_str())
    .bind(&build.error)
    .bind(build.created)
    .bind(build.enqueued)
    .bind(build.started)
    .bind(build.finished)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Find a build by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Build>, sqlx::Error> {
    let row = sqlx::query_as::<_, BuildRow>(
        r#"
        SELECT id, repo_id, number, org, repo, commit_sha, branch, event,
               tag, target, status, error, created, enqueued, started, finished
        FROM builds
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find the highest-numbered build of a repository on a branch
pub async fn find_last_for_repo(
    pool: &PgPool,
    repo_id: Uuid,
    branch: &str,
) -> Result<Option<Build>, sqlx::Error> {
    let row = sqlx::query_as::<_, BuildRow>(
        r#"
        SELECT id, repo_id, number, org, repo, commit_sha, branch, event,
               tag, target, status, error, created, enqueued, started, finished
        FROM builds
        WHERE repo_id = $1 AND branch = $2
        ORDER BY number DESC
        LIMIT 1
        "#,
    )
    .bind(repo_id)
    .bind(branch)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Persist the mutable fields of a build; returns whether a row was updated
pub async fn update(pool: &PgPool, build: &Build) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE builds
        SET status = $1, error = $2, enqueued = $3, started = $4, finished = $5
        WHERE id = $6
        "#,
    )
    .bind(build.status.as_str())
    .bind(&build.error)
    .bind(build.enqueued)
    .bind(build.started)
    .bind(build.finished)
    .bind(build.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct BuildRow {
    id: Uuid,
    repo_id: Uuid,
    number: i64,
    org: String,
    repo: String,
    commit_sha: String,
    branch: String,
    event: String,
    tag: Option<String>,
    target: Option<String>,
    status: String,
    error: Option<String>,
    created: DateTime<Utc>,
    enqueued: Option<DateTime<Utc>>,
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
}

impl From<BuildRow> for Build {
    fn from(row: BuildRow) -> Self {
        Build {
            id: row.id,
            repo_id: row.repo_id,
            number: row.number,
            org: row.org,
            repo: row.repo,
            commit: row.commit_sha,
            branch: row.branch,
            event: row.event,
            tag: row.tag,
            target: row.target,
            status: parse_status(&row.status),
            error: row.error,
            created: row.created,
            enqueued: row.enqueued,
            started: row.started,
            finished: row.finished,
        }
    }
}
