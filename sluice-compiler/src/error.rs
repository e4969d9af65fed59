//! Error types for the pipeline compiler

use thiserror::Error;

/// Errors reading template bytes
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source holds no template at the locator
    #[error("template not found at {0}")]
    NotFound(String),

    /// The locator cannot be interpreted
    #[error("invalid template source {locator}: {reason}")]
    InvalidSource { locator: String, reason: String },

    /// Network, filesystem or upstream failure
    #[error("unable to fetch template {locator}: {message}")]
    Transport { locator: String, message: String },
}

/// Errors rendering template bytes into fragment text
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template is not valid UTF-8")]
    InvalidUtf8,

    /// A `{{ .path }}` placeholder names a variable that was not passed
    #[error("variable `{0}` is not defined")]
    MissingVariable(String),

    /// The script failed or returned something that is not a table
    #[error("script error: {0}")]
    Script(String),

    #[error("unable to serialize script output: {0}")]
    Output(String),
}

/// Errors compiling a pipeline
///
/// Every variant is fatal: no partially resolved pipeline is ever returned.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("template {0} not found in pipeline templates")]
    TemplateNotFound(String),

    #[error("unable to fetch template {name}: {source}")]
    Fetch {
        name: String,
        #[source]
        source: FetchError,
    },

    #[error("unable to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: RenderError,
    },

    /// Pipeline or rendered fragment does not match the pipeline schema
    #[error("unable to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// A template's expansion chain reached the same `(name, source)` again
    #[error("circular template reference: {name} ({locator}) is already being expanded")]
    CircularReference { name: String, locator: String },

    #[error("template depth {depth} exceeds maximum of {max} while expanding {name}")]
    DepthExceeded {
        name: String,
        depth: usize,
        max: usize,
    },

    #[error("template {0} requests inline rendering, which is not supported")]
    UnsupportedInlineRender(String),

    /// Resolved pipeline is structurally invalid
    #[error("invalid pipeline: {0}")]
    Validation(String),
}

impl CompileError {
    pub(crate) fn parse(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.into(),
            message: err.to_string(),
        }
    }
}
