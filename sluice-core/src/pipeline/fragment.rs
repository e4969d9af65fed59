//! Output of a rendered template

use serde::{Deserialize, Serialize};

use super::{Container, Environment, Secret, Template};

/// Options a template sets about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    /// Requests that the fragment be injected without a fetch/render cycle.
    /// Not supported; expansion rejects it.
    #[serde(default)]
    pub render_inline: bool,
}

/// Flat pipeline fragment produced by rendering a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub metadata: FragmentMetadata,
    #[serde(default)]
    pub environment: Environment,
    /// Templates visible to steps emitted by this fragment
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub secrets: Vec<Secret>,
    #[serde(default)]
    pub services: Vec<Container>,
    #[serde(default)]
    pub steps: Vec<Container>,
}
