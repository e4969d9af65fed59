//! Template script evaluation
//!
//! Runs a script-format template in a fresh sandbox and converts the table
//! it returns into a serde value, ready to be serialized as a pipeline
//! fragment.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use mlua::{LuaSerdeExt, Value as LuaValue};

use crate::module::ModuleRegistry;
use crate::sandbox::create_sandbox;

/// Evaluate a template script
///
/// The registry's modules are loaded into the sandbox before the script
/// runs. It is aborted once it runs longer than `time_limit`. The script must return a table shaped like a pipeline fragment
/// (`steps`, `secrets`, `services`, `environment`, ...).
///
/// # Errors
/// Returns an error if:
/// - The sandbox or a module cannot be set up
/// - The script fails to load, raises an error or runs out of time
/// - The script returns something other than a table
///
/// # Example
/// ```no_run
/// use sluice_lua::{ModuleRegistry, evaluate_template, DEFAULT_MEMORY_LIMIT, DEFAULT_TIME_LIMIT};
///
/// let source = r#"
///     return {
///         steps = {
///             { name = "build", image = "golang:latest", commands = { "go build" } },
///         },
///     }
/// "#;
///
/// let fragment = evaluate_template(
///     source,
///     &ModuleRegistry::new(),
///     DEFAULT_MEMORY_LIMIT,
///     DEFAULT_TIME_LIMIT,
/// )?;
/// assert!(fragment["steps"].is_array());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn evaluate_template(
    source: &str,
    registry: &ModuleRegistry,
    memory_limit: usize,
    time_limit: Duration,
) -> Result<serde_json::Value> {
    let lua =
        create_sandbox(memory_limit, time_limit).context("Failed to create template sandbox")?;

    registry
        .register_all(&lua)
        .context("Failed to register template modules")?;

    let output: LuaValue = lua
        .load(source)
        .set_name("template")
        .eval()
        .context("Failed to evaluate template script")?;

    if !output.is_table() {
        bail!(
            "Template script must return a table, got {}",
            output.type_name()
        );
    }

    let fragment: serde_json::Value = lua
        .from_value(output)
        .context("Failed to convert template output")?;

    Ok(fragment)
}
