//! Data Transfer Objects
//!
//! Request and response bodies exchanged between the server, the CLI and
//! workers pulling from the queue.

pub mod build;
pub mod pipeline;
pub mod queue;
