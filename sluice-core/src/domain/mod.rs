//! Core domain types
//!
//! Records the server persists for every build. They are created by the
//! planner, mutated by status transitions and torn down by the lifecycle
//! controller.

pub mod build;
pub mod log;
pub mod service;
pub mod status;
pub mod step;

pub use build::Build;
pub use log::Log;
pub use service::Service;
pub use status::Status;
pub use step::Step;
