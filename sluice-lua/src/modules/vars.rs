//! Template variables module
//!
//! Exposes the variables of a template call (declared defaults merged with
//! the calling step's `vars`) to the script as the global `vars` table.

use crate::module::SluiceModule;
use mlua::prelude::*;
use sluice_core::pipeline::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Variables module for template scripts
pub struct VarsModule {
    vars: Arc<BTreeMap<String, Value>>,
}

impl VarsModule {
    /// Creates a new VarsModule over the resolved template variables
    pub fn new(vars: BTreeMap<String, Value>) -> Self {
        Self {
            vars: Arc::new(vars),
        }
    }
}

impl SluiceModule for VarsModule {
    fn id(&self) -> &'static str {
        "vars"
    }

    fn register(&self, lua: &Lua) -> LuaResult<()> {
        let vars_table = lua.create_table()?;

        // vars.get(name, default?) - Get a variable, or the default when absent
        {
            let vars = self.vars.clone();
            vars_table.set(
                "get",
                lua.create_function(move |lua, (name, default): (String, LuaValue)| {
                    match vars.get(&name) {
                        Some(value) => lua.to_value(value),
                        None => Ok(default),
                    }
                })?,
            )?;
        }

        // vars.require(name) - Get a variable, erroring if it was not passed
        {
            let vars = self.vars.clone();
            vars_table.set(
                "require",
                lua.create_function(move |lua, name: String| {
                    let value = vars.get(&name).ok_or_else(|| {
                        LuaError::RuntimeError(format!(
                            "Required template variable '{}' is not set",
                            name
                        ))
                    })?;
                    lua.to_value(value)
                })?,
            )?;
        }

        // vars.has(name) - Check if a variable was passed
        {
            let vars = self.vars.clone();
            vars_table.set(
                "has",
                lua.create_function(move |_, name: String| Ok(vars.contains_key(&name)))?,
            )?;
        }

        // vars.all() - All variables as a table
        {
            let vars = self.vars.clone();
            vars_table.set(
                "all",
                lua.create_function(move |lua, ()| lua.to_value(vars.as_ref()))?,
            )?;
        }

        lua.globals().set(self.id(), vars_table)?;
        Ok(())
    }

    fn stubs(&self) -> String {
        r#"---@meta

---Variables passed to this template
---@class vars
vars = {}

---Get a variable, or `default` when it was not passed
---@param name string
---@param default any?
---@return any
function vars.get(name, default) end

---Get a variable, raising an error when it was not passed
---@param name string
---@return any
function vars.require(name) end

---Check whether a variable was passed
---@param name string
---@return boolean
function vars.has(name) end

---All variables as a table
---@return table<string, any>
function vars.all() end
"#
        .to_string()
    }

    fn metadata(&self) -> crate::module::ModuleMetadata {
        crate::module::ModuleMetadata {
            id: self.id(),
            version: "1.0.0",
            description: "Template variables for Sluice templates",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> VarsModule {
        let mut vars = BTreeMap::new();
        vars.insert("image".to_string(), Value::from("golang:latest"));
        vars.insert("retries".to_string(), Value::Integer(3));
        vars.insert(
            "commands".to_string(),
            Value::List(vec![Value::from("go build"), Value::from("go test")]),
        );
        VarsModule::new(vars)
    }

    #[test]
    fn test_vars_get_and_default() {
        let lua = Lua::new();
        module().register(&lua).unwrap();

        let image: String = lua.load(r#"return vars.get("image")"#).eval().unwrap();
        assert_eq!(image, "golang:latest");

        let retries: i64 = lua.load(r#"return vars.get("retries")"#).eval().unwrap();
        assert_eq!(retries, 3);

        let fallback: String = lua
            .load(r#"return vars.get("missing", "fallback")"#)
            .eval()
            .unwrap();
        assert_eq!(fallback, "fallback");
    }

    #[test]
    fn test_vars_lists_become_sequences() {
        let lua = Lua::new();
        module().register(&lua).unwrap();

        let second: String = lua
            .load(r#"return vars.get("commands")[2]"#)
            .eval()
            .unwrap();
        assert_eq!(second, "go test");
    }

    #[test]
    fn test_vars_require_missing_errors() {
        let lua = Lua::new();
        module().register(&lua).unwrap();

        let result: LuaResult<LuaValue> = lua.load(r#"return vars.require("nope")"#).eval();
        assert!(result.is_err());

        let has: bool = lua.load(r#"return vars.has("image")"#).eval().unwrap();
        assert!(has);
    }

    #[test]
    fn test_vars_stubs() {
        let stubs = module().stubs();
        assert!(stubs.contains("---@meta"));
        assert!(stubs.contains("function vars.get"));
    }
}
