//! Lua sandbox creation
//!
//! This module provides a restricted Lua sandbox for template scripts. A
//! template may only compute and return a table; it has no filesystem,
//! network or process access and cannot load other code.

use std::time::{Duration, Instant};

use mlua::{HookTriggers, Lua, LuaOptions, Result as LuaResult, StdLib, VmState};

/// Memory ceiling applied to every template sandbox (16 MiB)
pub const DEFAULT_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

/// Wall-clock budget for a single template evaluation
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(5);

/// Instructions executed between deadline checks
const HOOK_INSTRUCTION_INTERVAL: u32 = 10_000;

/// Create a restricted Lua sandbox
///
/// This sandbox includes only basic Lua functionality (tables, strings, math, coroutines)
/// and does NOT include any I/O capabilities or the ability to load external code.
///
/// # Security
/// This sandbox prevents:
/// - File system access
/// - Process execution
/// - Loading external modules or chunks via require(), dofile(), loadfile() or load()
/// - Unbounded memory growth
/// - Running past `time_limit`, measured from sandbox creation
///
/// Modules (vars, log) are registered by the caller after creating the sandbox.
///
/// # Example
/// ```no_run
/// use sluice_lua::sandbox::{DEFAULT_MEMORY_LIMIT, DEFAULT_TIME_LIMIT, create_sandbox};
///
/// let lua = create_sandbox(DEFAULT_MEMORY_LIMIT, DEFAULT_TIME_LIMIT)?;
/// let steps: mlua::Table = lua.load(r#"return { steps = {} }"#).eval()?;
/// # Ok::<(), mlua::Error>(())
/// ```
pub fn create_sandbox(memory_limit: usize, time_limit: Duration) -> LuaResult<Lua> {
    // Only allow: TABLE, STRING, MATH, COROUTINE
    // Explicitly exclude: IO, OS, PACKAGE, DEBUG
    let lua = unsafe {
        Lua::unsafe_new_with(
            StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::COROUTINE,
            LuaOptions::default(),
        )
    };

    // Remove dangerous globals
    lua.globals().set("require", mlua::Nil)?;
    lua.globals().set("dofile", mlua::Nil)?;
    lua.globals().set("loadfile", mlua::Nil)?;
    lua.globals().set("load", mlua::Nil)?;

    lua.set_memory_limit(memory_limit)?;

    // Global so coroutines started by the script are bounded too
    let deadline = Instant::now() + time_limit;
    lua.set_global_hook(
        HookTriggers::new().every_nth_instruction(HOOK_INSTRUCTION_INTERVAL),
        move |_, _| {
            if Instant::now() >= deadline {
                return Err(mlua::Error::runtime(format!(
                    "template script exceeded time limit of {}ms",
                    time_limit.as_millis()
                )));
            }
            Ok(VmState::Continue)
        },
    )?;

    Ok(lua)
}
