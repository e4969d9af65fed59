//! Template fetching
//!
//! Expansion never reads templates itself; it asks a [`TemplateFetcher`].
//! The server plugs in a source-control backed fetcher, tests and the CLI
//! use [`FileFetcher`] or an in-memory map.

use async_trait::async_trait;
use sluice_core::pipeline::Template;
use std::path::{Component, Path, PathBuf};

use crate::error::FetchError;

/// Reads the raw bytes of a template declaration
#[async_trait]
pub trait TemplateFetcher: Send + Sync {
    async fn fetch(&self, template: &Template) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher that resolves every template source as a path under a root
/// directory, regardless of driver
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, source: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(source.trim_start_matches('/'));

        // Sources must stay under the root
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::InvalidSource {
                locator: source.to_string(),
                reason: "path escapes the template directory".to_string(),
            });
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl TemplateFetcher for FileFetcher {
    async fn fetch(&self, template: &Template) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(&template.source)?;
        tracing::debug!("Reading template {} from {}", template.name, path.display());

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(template.source.clone()),
            _ => FetchError::Transport {
                locator: template.source.clone(),
                message: e.to_string(),
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory fetcher keyed by template source
    #[derive(Default)]
    pub struct MapFetcher {
        templates: HashMap<String, Vec<u8>>,
        fetched: Mutex<Vec<String>>,
    }

    impl MapFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, source: &str, body: &str) -> Self {
            self.templates
                .insert(source.to_string(), body.as_bytes().to_vec());
            self
        }

        /// Sources requested so far, in order
        pub fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TemplateFetcher for MapFetcher {
        async fn fetch(&self, template: &Template) -> Result<Vec<u8>, FetchError> {
            self.fetched.lock().unwrap().push(template.source.clone());
            self.templates
                .get(&template.source)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(template.source.clone()))
        }
    }
}
