//! Template command handlers
//!
//! Renders a single template without a pipeline around it, and sets up
//! editor support for script templates.

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use colored::*;
use sluice_compiler::render::{render, script};
use sluice_core::pipeline::{Format, Fragment, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Template subcommands
#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Render a template and print the fragment it produces
    Render {
        /// Path to the template file
        file: String,

        /// Template format
        #[arg(short, long, value_enum, default_value_t = TemplateFormat::Native)]
        format: TemplateFormat,

        /// Variables as key=value pairs; values are parsed as YAML
        #[arg(short, long, value_parser = parse_var)]
        var: Vec<(String, Value)>,
    },
    /// Generate Lua development files (.luarc.json and stubs)
    Init {
        /// Output directory for generated files
        #[arg(short, long, default_value = ".")]
        output: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateFormat {
    Native,
    Lua,
}

impl From<TemplateFormat> for Format {
    fn from(format: TemplateFormat) -> Self {
        match format {
            TemplateFormat::Native => Format::Native,
            TemplateFormat::Lua => Format::Script,
        }
    }
}

/// Parse a single key=value pair
fn parse_var(s: &str) -> Result<(String, Value)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    let value = serde_yaml::from_str(&s[pos + 1..])
        .with_context(|| format!("invalid value for `{}`", &s[..pos]))?;
    Ok((s[..pos].to_string(), value))
}

pub async fn handle_template_command(command: TemplateCommands) -> Result<()> {
    match command {
        TemplateCommands::Render { file, format, var } => {
            let vars: BTreeMap<String, Value> = var.into_iter().collect();
            print!("{}", render_file(&file, format.into(), &vars)?);
            Ok(())
        }
        TemplateCommands::Init { output } => {
            for path in write_lua_dev_files(Path::new(&output))? {
                println!("  {} {}", "Created".green(), path.display());
            }
            println!("{}", "✓ Lua development files generated!".green().bold());
            Ok(())
        }
    }
}

/// Render a template and check the output parses as a fragment
fn render_file(path: &str, format: Format, vars: &BTreeMap<String, Value>) -> Result<String> {
    let raw = fs::read(path).with_context(|| format!("Failed to read template file: {}", path))?;

    let text = render(&raw, format, vars).with_context(|| format!("Failed to render {}", path))?;
    serde_yaml::from_str::<Fragment>(&text)
        .with_context(|| format!("{} did not render into a pipeline fragment", path))?;

    Ok(text)
}

/// Writes `.luarc.json` and one stub per template module
///
/// Stubs come from the modules the compiler actually loads, so they stay
/// in sync with what scripts can call.
fn write_lua_dev_files(output: &Path) -> Result<Vec<PathBuf>> {
    let registry = script::modules(BTreeMap::new());
    let stubs_dir = output.join(".sluice").join("stubs");
    fs::create_dir_all(&stubs_dir)
        .with_context(|| format!("Failed to create stubs directory at {:?}", stubs_dir))?;

    let mut created = Vec::new();
    let mut globals = Vec::new();

    for module in registry.modules() {
        let path = stubs_dir.join(format!("{}.lua", module.id()));
        fs::write(&path, module.stubs())
            .with_context(|| format!("Failed to write stub file {:?}", path))?;
        globals.push(module.id());
        created.push(path);
    }

    let luarc = serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/sumneko/vscode-lua/master/setting/schema.json",
        "runtime": { "version": "Lua 5.4" },
        "diagnostics": { "globals": globals },
        "workspace": { "library": [".sluice/stubs"], "checkThirdParty": false },
        "completion": { "callSnippet": "Both" }
    });
    let luarc_path = output.join(".luarc.json");
    fs::write(&luarc_path, serde_json::to_string_pretty(&luarc)?)
        .with_context(|| format!("Failed to write .luarc.json to {:?}", luarc_path))?;
    created.push(luarc_path);

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TESTDATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../sluice-compiler/testdata");

    #[test]
    fn test_parse_var() {
        let (key, value) = parse_var("image=golang:1.22").unwrap();
        assert_eq!(key, "image");
        assert_eq!(value, Value::from("golang:1.22"));

        let (_, value) = parse_var("commands=[go vet, go test]").unwrap();
        assert!(matches!(value, Value::List(ref items) if items.len() == 2));

        assert!(parse_var("image").is_err());
    }

    #[test]
    fn test_render_native_file() {
        let mut vars = BTreeMap::new();
        vars.insert("image".to_string(), Value::from("node:20"));

        let text = render_file(&format!("{}/npm.yml", TESTDATA), Format::Native, &vars).unwrap();
        assert!(text.contains("image: node:20"));
    }

    #[test]
    fn test_render_native_file_missing_variable() {
        let result = render_file(&format!("{}/npm.yml", TESTDATA), Format::Native, &BTreeMap::new());
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("image"));
    }

    #[test]
    fn test_render_script_file() {
        let text = render_file(
            &format!("{}/template.lua", TESTDATA),
            TemplateFormat::Lua.into(),
            &BTreeMap::new(),
        )
        .unwrap();

        let fragment: Fragment = serde_yaml::from_str(&text).unwrap();
        assert_eq!(fragment.steps[0].name, "build");
        assert_eq!(fragment.steps[0].image, "golang:latest");
    }

    #[test]
    fn test_write_lua_dev_files() {
        let output = std::env::temp_dir().join(format!("sluice-cli-init-{}", std::process::id()));

        let created = write_lua_dev_files(&output).unwrap();
        assert_eq!(created.len(), 3);

        let vars_stub = fs::read_to_string(output.join(".sluice/stubs/vars.lua")).unwrap();
        assert!(vars_stub.contains("function vars.get"));

        let luarc = fs::read_to_string(output.join(".luarc.json")).unwrap();
        assert!(luarc.contains("\"vars\""));
        assert!(luarc.contains("\"log\""));

        fs::remove_dir_all(&output).unwrap();
    }
}
