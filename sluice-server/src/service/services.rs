//! Service Planner
//!
//! Turns the services of a resolved pipeline into pending service records.

use sluice_core::domain::{Build, Log, Service};
use sluice_core::pipeline::Pipeline;

use super::PlanError;
use crate::database::Database;

/// Create a pending service record and an empty log for every service
///
/// Services are numbered from 1 in declaration order. Like step planning,
/// the first failure returns the records created so far.
pub async fn plan_services(
    db: &dyn Database,
    pipeline: &Pipeline,
    build: &Build,
) -> Result<Vec<Service>, PlanError<Service>> {
    let mut planned = Vec::new();

    for (number, container) in (1..).zip(pipeline.services.iter()) {
        let service = Service::pending(build, number, &container.name, &container.image);

        let service = match db.create_service(&service).await {
            Ok(service) => service,
            Err(source) => {
                return Err(PlanError {
                    planned,
                    message: format!("unable to create service {}", container.name),
                    source,
                });
            }
        };
        planned.push(service.clone());

        let log = Log::for_service(build.id, build.repo_id, service.id);
        if let Err(source) = db.create_log(&log).await {
            return Err(PlanError {
                planned,
                message: format!("unable to create logs for service {}", service.name),
                source,
            });
        }
    }

    tracing::info!(
        "Planned {} services for build {} of {}",
        planned.len(),
        build.number,
        build.full_name()
    );

    Ok(planned)
}
