//! Sluice Pipeline Compiler
//!
//! Turns a pipeline document into a resolved, template-free pipeline.
//!
//! The pieces, leaves first:
//! - [`rules`]: decides whether a step applies to the current build
//! - [`fetch`]: the boundary that reads template bytes
//! - [`render`]: native and script template rendering
//! - [`expand`]: recursive template expansion with depth and cycle limits
//! - [`Compiler`]: parse, expand and validate in one call
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sluice_compiler::{Compiler, FileFetcher};
//! use sluice_core::pipeline::RuleData;
//!
//! # async fn example() -> Result<(), sluice_compiler::CompileError> {
//! let compiler = Compiler::new(Arc::new(FileFetcher::new("./templates")));
//! let rules = RuleData { branch: "main".to_string(), ..Default::default() };
//! let resolved = compiler.compile(b"steps: []", &rules).await?;
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod error;
pub mod expand;
pub mod fetch;
pub mod render;
pub mod rules;

pub use compiler::{Compiler, DEFAULT_MAX_TEMPLATE_DEPTH};
pub use error::{CompileError, FetchError, RenderError};
pub use fetch::{FileFetcher, TemplateFetcher};
