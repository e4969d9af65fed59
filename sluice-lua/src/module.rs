use mlua::prelude::*;

/// Trait for Sluice Lua modules.
///
/// Each module provides functionality to template scripts running in the
/// sandbox. Modules must have a unique identifier and register their
/// functions as a global table named after it.
///
/// # Example
///
/// ```rust
/// use sluice_lua::SluiceModule;
/// use mlua::prelude::*;
///
/// struct TimeModule;
///
/// impl SluiceModule for TimeModule {
///     fn id(&self) -> &'static str {
///         "time"
///     }
///
///     fn register(&self, lua: &Lua) -> LuaResult<()> {
///         let table = lua.create_table()?;
///         table.set("zone", "UTC")?;
///         lua.globals().set(self.id(), table)?;
///         Ok(())
///     }
///
///     fn stubs(&self) -> String {
///         "---@meta\n---@class time\ntime = {}".to_string()
///     }
/// }
/// ```
pub trait SluiceModule: Send + Sync {
    /// Returns the unique identifier for this module.
    ///
    /// This identifier is used as the global variable name in Lua, so it
    /// must be a valid Lua identifier and unique across all modules.
    fn id(&self) -> &'static str;

    /// Registers this module's functions and values into the Lua context.
    ///
    /// # Errors
    /// Returns `LuaError` if registration fails (e.g., invalid function, type error)
    fn register(&self, lua: &Lua) -> LuaResult<()>;

    /// Generates Lua Language Server stubs for this module.
    ///
    /// The stub should start with `---@meta` to mark it as a definition file.
    fn stubs(&self) -> String;

    /// Returns module metadata (version, description)
    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata {
            id: self.id(),
            version: "0.1.0",
            description: "",
        }
    }
}

/// Metadata about a Sluice module
#[derive(Debug, Clone)]
pub struct ModuleMetadata {
    /// Module identifier
    pub id: &'static str,
    /// Module version (semver)
    pub version: &'static str,
    /// Brief description of module functionality
    pub description: &'static str,
}

/// Registry for managing Sluice modules
///
/// Collects the modules loaded into a template sandbox.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn SluiceModule>>,
}

impl ModuleRegistry {
    /// Creates a new empty module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Registers a module
    ///
    /// # Panics
    /// Panics if a module with the same ID is already registered
    pub fn register<M: SluiceModule + 'static>(&mut self, module: M) {
        let id = module.id();
        if self.modules.iter().any(|m| m.id() == id) {
            panic!("Module with id '{}' is already registered", id);
        }
        self.modules.push(Box::new(module));
    }

    /// Gets a module by its ID
    pub fn get(&self, id: &str) -> Option<&dyn SluiceModule> {
        self.modules
            .iter()
            .find(|m| m.id() == id)
            .map(|m| m.as_ref())
    }

    /// Returns all registered modules
    pub fn modules(&self) -> &[Box<dyn SluiceModule>] {
        &self.modules
    }

    /// Registers all modules into a Lua context
    ///
    /// # Errors
    /// Returns the first error encountered during registration
    pub fn register_all(&self, lua: &Lua) -> LuaResult<()> {
        for module in &self.modules {
            module.register(lua)?;
        }
        Ok(())
    }

    /// Generates a combined stub file for all registered modules
    pub fn generate_stubs(&self) -> String {
        let mut stubs = String::new();
        for module in &self.modules {
            stubs.push_str(&module.stubs());
            stubs.push_str("\n\n");
        }
        stubs
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
