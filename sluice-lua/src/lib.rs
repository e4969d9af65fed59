//! Sluice Lua Infrastructure
//!
//! Runs script-format pipeline templates. It includes:
//! - Module trait and registry for Lua modules
//! - A restricted sandbox with no host I/O and a memory ceiling
//! - The `vars` and `log` modules exposed to templates
//! - Template evaluation into a serde value
//! - Stub generation for template authors

pub mod evaluator;
pub mod module;
pub mod modules;
pub mod sandbox;

pub use evaluator::evaluate_template;
pub use module::{ModuleMetadata, ModuleRegistry, SluiceModule};
pub use modules::{LogLevel, LogModule, LogSink, VarsModule};
pub use sandbox::{DEFAULT_MEMORY_LIMIT, DEFAULT_TIME_LIMIT, create_sandbox};
