//! Postgres-backed [`Database`]

use async_trait::async_trait;
use sluice_core::domain::{Build, Log, Service, Step};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Database, DatabaseError, status_counts};
use crate::repository::{build_repository, log_repository, service_repository, step_repository};

/// [`Database`] over the repository functions
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become [`DatabaseError::Conflict`]
fn map_err(what: impl FnOnce() -> String) -> impl FnOnce(sqlx::Error) -> DatabaseError {
    move |err| {
        let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
        if unique {
            DatabaseError::Conflict(what())
        } else {
            DatabaseError::Sqlx(err)
        }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn create_build(&self, build: &Build) -> Result<Build, DatabaseError> {
        build_repository::create(&self.pool, build)
            .await
            .map_err(map_err(|| format!("build for repo {}", build.full_name())))
    }

    async fn get_build(&self, id: Uuid) -> Result<Build, DatabaseError> {
        build_repository::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("build {}", id)))
    }

    async fn update_build(&self, build: &Build) -> Result<Build, DatabaseError> {
        if !build_repository::update(&self.pool, build).await? {
            return Err(DatabaseError::NotFound(format!("build {}", build.id)));
        }
        Ok(build.clone())
    }

    async fn last_build_for_repo(
        &self,
        repo_id: Uuid,
        branch: &str,
    ) -> Result<Build, DatabaseError> {
        build_repository::find_last_for_repo(&self.pool, repo_id, branch)
            .await?
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("build for repo {} on branch {}", repo_id, branch))
            })
    }

    async fn create_step(&self, step: &Step) -> Result<Step, DatabaseError> {
        step_repository::create(&self.pool, step)
            .await
            .map_err(map_err(|| format!("step number {} already exists", step.number)))?;
        Ok(step.clone())
    }

    async fn update_step(&self, step: &Step) -> Result<Step, DatabaseError> {
        if !step_repository::update(&self.pool, step).await? {
            return Err(DatabaseError::NotFound(format!("step {}", step.name)));
        }
        Ok(step.clone())
    }

    async fn list_steps_for_build(&self, build_id: Uuid) -> Result<Vec<Step>, DatabaseError> {
        Ok(step_repository::find_by_build(&self.pool, build_id).await?)
    }

    async fn get_step_for_build(
        &self,
        build_id: Uuid,
        number: i32,
    ) -> Result<Step, DatabaseError> {
        step_repository::find_by_number(&self.pool, build_id, number)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("step {} for build {}", number, build_id)))
    }

    async fn create_service(&self, service: &Service) -> Result<Service, DatabaseError> {
        service_repository::create(&self.pool, service)
            .await
            .map_err(map_err(|| format!("service number {} already exists", service.number)))?;
        Ok(service.clone())
    }

    async fn update_service(&self, service: &Service) -> Result<Service, DatabaseError> {
        if !service_repository::update(&self.pool, service).await? {
            return Err(DatabaseError::NotFound(format!("service {}", service.name)));
        }
        Ok(service.clone())
    }

    async fn list_services_for_build(
        &self,
        build_id: Uuid,
    ) -> Result<Vec<Service>, DatabaseError> {
        Ok(service_repository::find_by_build(&self.pool, build_id).await?)
    }

    async fn create_log(&self, log: &Log) -> Result<Log, DatabaseError> {
        log_repository::create(&self.pool, log).await?;
        Ok(log.clone())
    }

    async fn count_steps_by_status(&self) -> Result<BTreeMap<String, i64>, DatabaseError> {
        let counts = step_repository::count_by_status(&self.pool).await?;
        Ok(status_counts(counts))
    }
}
