//! Modules available to template scripts
//!
//! - `vars`: the variables the calling step passed to the template
//! - `log`: diagnostics routed to whichever sink the caller provides

pub mod log;
pub mod vars;

pub use log::{LogLevel, LogModule, LogSink};
pub use vars::VarsModule;
