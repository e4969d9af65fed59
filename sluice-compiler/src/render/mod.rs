//! Template rendering
//!
//! Turns raw template bytes plus a variable bag into fragment text. The
//! format tag picks the renderer; callers only ever go through [`render`].

pub mod native;
pub mod script;

use sluice_core::pipeline::{Format, Value};
use std::collections::BTreeMap;

use crate::error::RenderError;

/// Render a template into YAML fragment text
pub fn render(
    raw: &[u8],
    format: Format,
    vars: &BTreeMap<String, Value>,
) -> Result<String, RenderError> {
    let text = std::str::from_utf8(raw).map_err(|_| RenderError::InvalidUtf8)?;

    match format {
        Format::Native => native::render(text, vars),
        Format::Script => script::render(text, vars),
    }
}
