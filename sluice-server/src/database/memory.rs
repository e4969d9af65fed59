//! In-memory [`Database`]
//!
//! Backs `DATABASE_URL=memory://` and the planner and lifecycle tests.
//! Failures can be injected per operation with [`MemoryDatabase::inject`].

use async_trait::async_trait;
use sluice_core::domain::{Build, Log, Service, Step};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Database, DatabaseError, status_counts};

/// An operation that should fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    CreateBuild,
    UpdateBuild,
    /// Creating the step with this number
    CreateStep(i32),
    /// Updating the step with this name
    UpdateStep(String),
    /// Creating the service with this number
    CreateService(i32),
    /// Updating the service with this name
    UpdateService(String),
    /// Creating the nth log, counting from 1
    CreateLog(usize),
}

#[derive(Debug, Default)]
struct State {
    builds: HashMap<Uuid, Build>,
    steps: Vec<Step>,
    services: Vec<Service>,
    logs: Vec<Log>,
    faults: Vec<Fault>,
}

impl State {
    fn check(&self, fault: Fault) -> Result<(), DatabaseError> {
        if self.faults.contains(&fault) {
            return Err(DatabaseError::Unavailable(format!("injected {:?}", fault)));
        }
        Ok(())
    }
}

/// In-memory store with the same uniqueness rules as the Postgres schema
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later matching operation fail
    pub fn inject(&self, fault: Fault) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.push(fault);
        }
    }

    /// Logs created so far
    pub fn logs(&self) -> Vec<Log> {
        self.state
            .lock()
            .map(|state| state.logs.clone())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, DatabaseError> {
        self.state
            .lock()
            .map_err(|_| DatabaseError::Unavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn create_build(&self, build: &Build) -> Result<Build, DatabaseError> {
        let mut state = self.state()?;
        state.check(Fault::CreateBuild)?;

        let number = state
            .builds
            .values()
            .filter(|b| b.repo_id == build.repo_id)
            .map(|b| b.number)
            .max()
            .unwrap_or(0)
            + 1;

        let mut stored = build.clone();
        stored.number = number;
        state.builds.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn get_build(&self, id: Uuid) -> Result<Build, DatabaseError> {
        self.state()?
            .builds
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("build {}", id)))
    }

    async fn update_build(&self, build: &Build) -> Result<Build, DatabaseError> {
        let mut state = self.state()?;
        state.check(Fault::UpdateBuild)?;

        let stored = state
            .builds
            .get_mut(&build.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("build {}", build.id)))?;
        *stored = build.clone();

        Ok(build.clone())
    }

    async fn last_build_for_repo(
        &self,
        repo_id: Uuid,
        branch: &str,
    ) -> Result<Build, DatabaseError> {
        self.state()?
            .builds
            .values()
            .filter(|b| b.repo_id == repo_id && b.branch == branch)
            .max_by_key(|b| b.number)
            .cloned()
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("build for repo {} on branch {}", repo_id, branch))
            })
    }

    async fn create_step(&self, step: &Step) -> Result<Step, DatabaseError> {
        let mut state = self.state()?;
        state.check(Fault::CreateStep(step.number))?;

        if state
            .steps
            .iter()
            .any(|s| s.build_id == step.build_id && s.number == step.number)
        {
            return Err(DatabaseError::Conflict(format!(
                "step number {} already exists",
                step.number
            )));
        }

        state.steps.push(step.clone());
        Ok(step.clone())
    }

    async fn update_step(&self, step: &Step) -> Result<Step, DatabaseError> {
        let mut state = self.state()?;
        state.check(Fault::UpdateStep(step.name.clone()))?;

        let stored = state
            .steps
            .iter_mut()
            .find(|s| s.id == step.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("step {}", step.name)))?;
        *stored = step.clone();

        Ok(step.clone())
    }

    async fn list_steps_for_build(&self, build_id: Uuid) -> Result<Vec<Step>, DatabaseError> {
        let mut steps: Vec<Step> = self
            .state()?
            .steps
            .iter()
            .filter(|s| s.build_id == build_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.number);
        Ok(steps)
    }

    async fn get_step_for_build(
        &self,
        build_id: Uuid,
        number: i32,
    ) -> Result<Step, DatabaseError> {
        self.state()?
            .steps
            .iter()
            .find(|s| s.build_id == build_id && s.number == number)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("step {} for build {}", number, build_id)))
    }

    async fn create_service(&self, service: &Service) -> Result<Service, DatabaseError> {
        let mut state = self.state()?;
        state.check(Fault::CreateService(service.number))?;

        if state
            .services
            .iter()
            .any(|s| s.build_id == service.build_id && s.number == service.number)
        {
            return Err(DatabaseError::Conflict(format!(
                "service number {} already exists",
                service.number
            )));
        }

        state.services.push(service.clone());
        Ok(service.clone())
    }

    async fn update_service(&self, service: &Service) -> Result<Service, DatabaseError> {
        let mut state = self.state()?;
        state.check(Fault::UpdateService(service.name.clone()))?;

        let stored = state
            .services
            .iter_mut()
            .find(|s| s.id == service.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("service {}", service.name)))?;
        *stored = service.clone();

        Ok(service.clone())
    }

    async fn list_services_for_build(
        &self,
        build_id: Uuid,
    ) -> Result<Vec<Service>, DatabaseError> {
        let mut services: Vec<Service> = self
            .state()?
            .services
            .iter()
            .filter(|s| s.build_id == build_id)
            .cloned()
            .collect();
        services.sort_by_key(|s| s.number);
        Ok(services)
    }

    async fn create_log(&self, log: &Log) -> Result<Log, DatabaseError> {
        let mut state = self.state()?;
        state.check(Fault::CreateLog(state.logs.len() + 1))?;

        state.logs.push(log.clone());
        Ok(log.clone())
    }

    async fn count_steps_by_status(&self) -> Result<BTreeMap<String, i64>, DatabaseError> {
        let counts = self
            .state()?
            .steps
            .iter()
            .map(|s| (s.status.as_str().to_string(), 1))
            .collect::<Vec<_>>();
        Ok(status_counts(counts))
    }
}
