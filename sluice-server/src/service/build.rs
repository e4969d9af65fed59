//! Build Service
//!
//! Creates builds from pipeline documents and tears them down again when
//! planning, dispatch or a user kills them.

use chrono::Utc;
use sluice_compiler::CompileError;
use sluice_core::domain::{Build, Service, Status, Step};
use sluice_core::dto::build::{BuildSummary, CreateBuild};
use sluice_core::dto::queue::QueueItem;
use uuid::Uuid;

use super::pipeline::Compilers;
use super::{service_planner, step_planner};
use crate::database::{Database, DatabaseError};
use crate::queue::Queue;

/// Service error type
#[derive(Debug)]
pub enum BuildError {
    NotFound(Uuid),
    InvalidState(String),
    /// The pipeline could not be compiled; nothing was persisted
    CompileError(CompileError),
    /// Planning failed; the build was cleaned up
    PlanError(String),
    /// Publishing failed; the build was cleaned up
    DispatchError(String),
    DatabaseError(DatabaseError),
}

impl From<CompileError> for BuildError {
    fn from(err: CompileError) -> Self {
        BuildError::CompileError(err)
    }
}

impl From<DatabaseError> for BuildError {
    fn from(err: DatabaseError) -> Self {
        BuildError::DatabaseError(err)
    }
}

/// Compile, persist, plan and publish a new build
pub async fn create_build(
    db: &dyn Database,
    queue: &dyn Queue,
    compilers: &Compilers,
    req: CreateBuild,
) -> Result<BuildSummary, BuildError> {
    let rules = req.rule_data();
    let compiler = compilers.for_commit(&req.org, &req.repo, &req.commit);
    let mut pipeline = compiler.compile(req.pipeline.as_bytes(), &rules).await?;

    let build = db.create_build(&pending_build(&req)).await?;
    tracing::info!("Build {} of {} created: {}", build.number, build.full_name(), build.id);

    let services = match service_planner::plan_services(db, &pipeline, &build).await {
        Ok(services) => services,
        Err(e) => {
            clean_build(db, &build, &e.planned, &[], &e.to_string()).await;
            return Err(BuildError::PlanError(e.to_string()));
        }
    };

    let steps = match step_planner::plan_steps(db, &mut pipeline, &build).await {
        Ok(steps) => steps,
        Err(e) => {
            clean_build(db, &build, &services, &e.planned, &e.to_string()).await;
            return Err(BuildError::PlanError(e.to_string()));
        }
    };

    let mut build = build;
    build.enqueued = Some(Utc::now());

    // Persisted before publishing so a worker never pops an unrecorded build
    let build = match db.update_build(&build).await {
        Ok(build) => build,
        Err(e) => {
            let cause = format!("unable to update build: {}", e);
            clean_build(db, &build, &services, &steps, &cause).await;
            return Err(BuildError::DispatchError(cause));
        }
    };

    let item = QueueItem {
        build: build.clone(),
        pipeline,
    };

    if let Err(e) = queue.publish(item).await {
        let cause = format!("unable to publish to queue: {}", e);
        clean_build(db, &build, &services, &steps, &cause).await;
        return Err(BuildError::DispatchError(cause));
    }

    tracing::info!("Build {} of {} enqueued", build.number, build.full_name());

    Ok(BuildSummary {
        build,
        steps,
        services,
    })
}

/// Build with its steps and services
pub async fn get_build_summary(db: &dyn Database, id: Uuid) -> Result<BuildSummary, BuildError> {
    let build = get_build(db, id).await?;
    let steps = db.list_steps_for_build(id).await?;
    let services = db.list_services_for_build(id).await?;

    Ok(BuildSummary {
        build,
        steps,
        services,
    })
}

/// Get a build by ID
pub async fn get_build(db: &dyn Database, id: Uuid) -> Result<Build, BuildError> {
    db.get_build(id).await.map_err(|e| match e {
        DatabaseError::NotFound(_) => BuildError::NotFound(id),
        other => BuildError::DatabaseError(other),
    })
}

/// Kill a build that has not finished yet
///
/// Steps and services that already finished keep their status.
pub async fn kill_build(
    db: &dyn Database,
    id: Uuid,
    reason: Option<String>,
) -> Result<BuildSummary, BuildError> {
    let build = get_build(db, id).await?;

    if build.status.is_terminal() {
        return Err(BuildError::InvalidState(format!(
            "Build {} is already finished (status: {})",
            id, build.status
        )));
    }

    let steps: Vec<Step> = db
        .list_steps_for_build(id)
        .await?
        .into_iter()
        .filter(|s| !s.status.is_terminal())
        .collect();
    let services: Vec<Service> = db
        .list_services_for_build(id)
        .await?
        .into_iter()
        .filter(|s| !s.status.is_terminal())
        .collect();

    let cause = reason.unwrap_or_else(|| "build killed by request".to_string());
    clean_build(db, &build, &services, &steps, &cause).await;

    get_build_summary(db, id).await
}

/// Force a build and its in-flight records into a terminal state
///
/// The build gets status `error` with `cause` as its error; every given
/// service and step gets status `killed`. Each update is independent and
/// failures are only logged.
pub async fn clean_build(
    db: &dyn Database,
    build: &Build,
    services: &[Service],
    steps: &[Step],
    cause: &str,
) {
    let mut build = build.clone();
    build.error = Some(cause.to_string());
    build.status = Status::Error;
    build.finished = Some(Utc::now());

    if let Err(e) = db.update_build(&build).await {
        tracing::error!("unable to kill build {}: {}", build.number, e);
    }

    for service in services {
        let mut service = service.clone();
        service.status = Status::Killed;
        service.finished = Some(Utc::now());

        if let Err(e) = db.update_service(&service).await {
            tracing::error!(
                "unable to kill service {} for build {}: {}",
                service.name,
                build.number,
                e
            );
        }
    }

    for step in steps {
        let mut step = step.clone();
        step.status = Status::Killed;
        step.finished = Some(Utc::now());

        if let Err(e) = db.update_step(&step).await {
            tracing::error!(
                "unable to kill step {} for build {}: {}",
                step.name,
                build.number,
                e
            );
        }
    }

    tracing::info!("Build {} of {} cleaned: {}", build.number, build.full_name(), cause);
}

fn pending_build(req: &CreateBuild) -> Build {
    Build {
        id: Uuid::new_v4(),
        repo_id: req.repo_id,
        number: 0,
        org: req.org.clone(),
        repo: req.repo.clone(),
        commit: req.commit.clone(),
        branch: req.branch.clone(),
        event: req.event.clone(),
        tag: req.tag.clone(),
        target: req.target.clone(),
        status: Status::Pending,
        error: None,
        created: Utc::now(),
        enqueued: None,
        started: None,
        finished: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Fault, MemoryDatabase, sample_build};
    use crate::queue::ChannelQueue;
    use crate::service::pipeline::test_compilers;

    const PIPELINE: &str = r#"
version: "1"
services:
  - name: postgres
    image: postgres:12
stages:
  foo:
    steps:
      - name: clone
        image: git
      - name: test
        image: alpine
"#;

    fn request(pipeline: &str) -> CreateBuild {
        CreateBuild {
            repo_id: Uuid::new_v4(),
            org: "octocat".to_string(),
            repo: "hello-world".to_string(),
            commit: "7fd1a60".to_string(),
            branch: "main".to_string(),
            event: "push".to_string(),
            tag: None,
            target: None,
            changed_files: vec![],
            labels: vec![],
            pipeline: pipeline.to_string(),
        }
    }

    /// A build with two pending steps and one pending service
    async fn planned(db: &MemoryDatabase) -> (Build, Vec<Service>, Vec<Step>) {
        let build = db.create_build(&sample_build(Uuid::new_v4())).await.unwrap();
        let steps = vec![
            db.create_step(&Step::pending(&build, 1, "clone", "git", ""))
                .await
                .unwrap(),
            db.create_step(&Step::pending(&build, 2, "test", "alpine", ""))
                .await
                .unwrap(),
        ];
        let services = vec![
            db.create_service(&Service::pending(&build, 1, "postgres", "postgres:12"))
                .await
                .unwrap(),
        ];
        (build, services, steps)
    }

    #[tokio::test]
    async fn test_clean_build() {
        let db = MemoryDatabase::new();
        let (build, services, steps) = planned(&db).await;

        clean_build(&db, &build, &services, &steps, "unable to publish to queue: full").await;

        let summary = get_build_summary(&db, build.id).await.unwrap();
        assert_eq!(summary.build.status, Status::Error);
        assert_eq!(
            summary.build.error.as_deref(),
            Some("unable to publish to queue: full")
        );
        assert!(summary.build.finished.is_some());
        assert!(summary.steps.iter().all(|s| s.status == Status::Killed));
        assert!(summary.steps.iter().all(|s| s.finished.is_some()));
        assert_eq!(summary.services[0].status, Status::Killed);
    }

    #[tokio::test]
    async fn test_clean_build_is_best_effort() {
        let db = MemoryDatabase::new();
        let (build, services, steps) = planned(&db).await;
        db.inject(Fault::UpdateBuild);
        db.inject(Fault::UpdateStep("clone".to_string()));

        clean_build(&db, &build, &services, &steps, "boom").await;

        let summary = get_build_summary(&db, build.id).await.unwrap();
        assert_eq!(summary.build.status, Status::Pending);
        assert_eq!(summary.steps[0].status, Status::Pending);
        assert_eq!(summary.steps[1].status, Status::Killed);
        assert_eq!(summary.services[0].status, Status::Killed);
    }

    #[tokio::test]
    async fn test_create_build() {
        let db = MemoryDatabase::new();
        let queue = ChannelQueue::new(4);

        let summary = create_build(&db, &queue, &test_compilers(), request(PIPELINE))
            .await
            .unwrap();

        assert_eq!(summary.build.number, 1);
        assert!(summary.build.enqueued.is_some());
        assert_eq!(summary.steps.len(), 2);
        assert_eq!(summary.services.len(), 1);
        assert_eq!(db.logs().len(), 3);

        let item = queue.pop().await.unwrap().unwrap();
        assert_eq!(item.build.id, summary.build.id);
        assert_eq!(
            item.pipeline.stages[0].steps[1]
                .environment
                .get("SLUICE_STEP_NUMBER"),
            Some("2")
        );
    }

    #[tokio::test]
    async fn test_create_build_compile_failure_persists_nothing() {
        let db = MemoryDatabase::new();
        let queue = ChannelQueue::new(4);
        db.inject(Fault::CreateBuild);

        let result = create_build(
            &db,
            &queue,
            &test_compilers(),
            request("steps:\n  - name: x\n    template:\n      name: missing\n"),
        )
        .await;

        assert!(matches!(
            result,
            Err(BuildError::CompileError(CompileError::TemplateNotFound(_)))
        ));
        assert!(db.logs().is_empty());
    }

    #[tokio::test]
    async fn test_create_build_plan_failure_cleans_up() {
        let db = MemoryDatabase::new();
        let queue = ChannelQueue::new(4);
        db.inject(Fault::CreateStep(2));
        let req = request(PIPELINE);
        let repo_id = req.repo_id;

        let result = create_build(&db, &queue, &test_compilers(), req).await;
        assert!(
            matches!(result, Err(BuildError::PlanError(msg)) if msg.starts_with("unable to create step test"))
        );
        assert!(queue.pop().await.unwrap().is_none());

        let build = db
            .create_build(&sample_build(repo_id))
            .await
            .map(|b| b.number)
            .unwrap();
        assert_eq!(build, 2);
    }

    #[tokio::test]
    async fn test_create_build_dispatch_failure_cleans_up() {
        let db = MemoryDatabase::new();
        let queue = ChannelQueue::new(1);
        create_build(&db, &queue, &test_compilers(), request(PIPELINE))
            .await
            .unwrap();

        let result = create_build(&db, &queue, &test_compilers(), request(PIPELINE)).await;
        let Err(BuildError::DispatchError(cause)) = result else {
            panic!("expected dispatch error");
        };
        assert_eq!(cause, "unable to publish to queue: queue is full");
    }

    #[tokio::test]
    async fn test_create_build_update_failure_is_not_dispatched() {
        let db = MemoryDatabase::new();
        let queue = ChannelQueue::new(4);
        db.inject(Fault::UpdateBuild);

        let result = create_build(&db, &queue, &test_compilers(), request(PIPELINE)).await;
        let Err(BuildError::DispatchError(cause)) = result else {
            panic!("expected dispatch error");
        };
        assert!(cause.starts_with("unable to update build"));
        assert!(queue.pop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_kill_build() {
        let db = MemoryDatabase::new();
        let (build, _, steps) = planned(&db).await;

        let mut done = steps[0].clone();
        done.status = Status::Success;
        db.update_step(&done).await.unwrap();

        let summary = kill_build(&db, build.id, None).await.unwrap();

        assert_eq!(summary.build.status, Status::Error);
        assert_eq!(summary.build.error.as_deref(), Some("build killed by request"));
        assert_eq!(summary.steps[0].status, Status::Success);
        assert_eq!(summary.steps[1].status, Status::Killed);

        let again = kill_build(&db, build.id, None).await;
        assert!(matches!(again, Err(BuildError::InvalidState(_))));

        let missing = kill_build(&db, Uuid::new_v4(), None).await;
        assert!(matches!(missing, Err(BuildError::NotFound(_))));
    }
}
