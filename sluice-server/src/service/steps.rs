//! Step Planner
//!
//! Turns the steps of a resolved pipeline into pending step records.

use sluice_core::domain::{Build, Log, Step};
use sluice_core::pipeline::{Container, Pipeline};

use super::PlanError;
use crate::database::Database;

/// Create a pending step record and an empty log for every step
///
/// Steps are numbered from 1 in traversal order: stage steps in stage order,
/// then top-level steps. Each container receives the step's `SLUICE_STEP_*`
/// variables. The first persistence failure stops planning; records created
/// up to that point are returned with the error.
pub async fn plan_steps(
    db: &dyn Database,
    pipeline: &mut Pipeline,
    build: &Build,
) -> Result<Vec<Step>, PlanError<Step>> {
    let mut planned = Vec::new();
    let mut number = 1;

    for stage in pipeline.stages.iter_mut() {
        for container in stage.steps.iter_mut() {
            if let Err((message, source)) =
                plan_step(db, build, container, number, &stage.name, &mut planned).await
            {
                return Err(PlanError {
                    planned,
                    message,
                    source,
                });
            }
            number += 1;
        }
    }

    for container in pipeline.steps.iter_mut() {
        if let Err((message, source)) =
            plan_step(db, build, container, number, "", &mut planned).await
        {
            return Err(PlanError {
                planned,
                message,
                source,
            });
        }
        number += 1;
    }

    tracing::info!(
        "Planned {} steps for build {} of {}",
        planned.len(),
        build.number,
        build.full_name()
    );

    Ok(planned)
}

async fn plan_step(
    db: &dyn Database,
    build: &Build,
    container: &mut Container,
    number: i32,
    stage: &str,
    planned: &mut Vec<Step>,
) -> Result<(), (String, crate::database::DatabaseError)> {
    let step = Step::pending(build, number, &container.name, &container.image, stage);

    let step = db
        .create_step(&step)
        .await
        .map_err(|e| (format!("unable to create step {}", container.name), e))?;

    container.environment.overlay(step.environment());
    planned.push(step.clone());

    let log = Log::for_step(build.id, build.repo_id, step.id);
    db.create_log(&log)
        .await
        .map_err(|e| (format!("unable to create logs for step {}", step.name), e))?;

    tracing::debug!("Planned step {} ({}) for build {}", step.number, step.name, build.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Fault, MemoryDatabase, sample_build};
    use sluice_core::domain::Status;
    use uuid::Uuid;

    fn pipeline() -> Pipeline {
        serde_yaml::from_str(
            r#"
stages:
  foo:
    steps:
      - name: clone
        image: git
      - name: test
        image: alpine
        environment:
          SLUICE_STEP_NAME: overridden
          KEEP: kept
"#,
        )
        .unwrap()
    }

    fn pipeline_with_flat_step() -> Pipeline {
        let mut pipeline = pipeline();
        // A flat step after the stages exercises the second traversal loop
        pipeline.steps.push(Container {
            name: "publish".to_string(),
            image: "plugins/docker".to_string(),
            ..Default::default()
        });
        pipeline
    }

    #[tokio::test]
    async fn test_plan_numbers_stage_then_flat_steps() {
        let db = MemoryDatabase::new();
        let build = db.create_build(&sample_build(Uuid::new_v4())).await.unwrap();
        let mut pipeline = pipeline_with_flat_step();

        let steps = plan_steps(&db, &mut pipeline, &build).await.unwrap();

        let planned: Vec<(i32, &str, &str)> = steps
            .iter()
            .map(|s| (s.number, s.name.as_str(), s.stage.as_str()))
            .collect();
        assert_eq!(
            planned,
            vec![(1, "clone", "foo"), (2, "test", "foo"), (3, "publish", "")]
        );

        for step in &steps {
            assert_eq!(step.status, Status::Pending);
            assert_eq!(step.build_id, build.id);
            assert_eq!(step.repo_id, build.repo_id);
        }

        let logs = db.logs();
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|l| l.data.is_empty()));
        assert_eq!(logs[2].step_id, Some(steps[2].id));
    }

    #[tokio::test]
    async fn test_plan_overlays_step_environment() {
        let db = MemoryDatabase::new();
        let build = db.create_build(&sample_build(Uuid::new_v4())).await.unwrap();
        let mut pipeline = pipeline();

        plan_steps(&db, &mut pipeline, &build).await.unwrap();

        let test = &pipeline.stages[0].steps[1];
        assert_eq!(test.environment.get("SLUICE_STEP_NAME"), Some("test"));
        assert_eq!(test.environment.get("SLUICE_STEP_NUMBER"), Some("2"));
        assert_eq!(test.environment.get("SLUICE_STEP_STAGE"), Some("foo"));
        assert_eq!(test.environment.get("SLUICE_STEP_STATUS"), Some("pending"));
        assert_eq!(test.environment.get("KEEP"), Some("kept"));
    }

    #[tokio::test]
    async fn test_plan_failure_returns_created_steps() {
        let db = MemoryDatabase::new();
        let build = db.create_build(&sample_build(Uuid::new_v4())).await.unwrap();
        db.inject(Fault::CreateStep(3));
        let mut pipeline = pipeline_with_flat_step();

        let err = plan_steps(&db, &mut pipeline, &build).await.unwrap_err();

        assert_eq!(err.planned.len(), 2);
        assert_eq!(err.to_string().split(':').next(), Some("unable to create step publish"));
    }

    #[tokio::test]
    async fn test_log_failure_keeps_created_step() {
        let db = MemoryDatabase::new();
        let build = db.create_build(&sample_build(Uuid::new_v4())).await.unwrap();
        db.inject(Fault::CreateLog(2));
        let mut pipeline = pipeline();

        let err = plan_steps(&db, &mut pipeline, &build).await.unwrap_err();

        assert_eq!(err.message, "unable to create logs for step test");
        let names: Vec<&str> = err.planned.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["clone", "test"]);
    }
}
