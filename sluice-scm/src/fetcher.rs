//! Template fetcher backed by the source-control host

use async_trait::async_trait;
use sluice_compiler::{FetchError, TemplateFetcher};
use sluice_core::pipeline::{Driver, Template};

use crate::ScmClient;
use crate::error::ScmError;
use crate::source::TemplateSource;

/// Fetches templates for one build
///
/// `file` templates are read from the repository being built at the build's
/// commit. `remote` templates name their own repository and reference.
#[derive(Debug, Clone)]
pub struct ScmFetcher {
    client: ScmClient,
    org: String,
    repo: String,
    commit: String,
}

impl ScmFetcher {
    pub fn new(
        client: ScmClient,
        org: impl Into<String>,
        repo: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            client,
            org: org.into(),
            repo: repo.into(),
            commit: commit.into(),
        }
    }
}

#[async_trait]
impl TemplateFetcher for ScmFetcher {
    async fn fetch(&self, template: &Template) -> Result<Vec<u8>, FetchError> {
        let result = match template.driver {
            Driver::File => {
                self.client
                    .fetch_contents(&self.org, &self.repo, &template.source, Some(&self.commit))
                    .await
            }
            Driver::Remote => {
                let source = TemplateSource::parse(&template.source)
                    .map_err(|e| into_fetch_error(&template.source, e))?;

                self.client
                    .fetch_contents(
                        &source.org,
                        &source.repo,
                        &source.path,
                        source.reference.as_deref(),
                    )
                    .await
            }
        };

        result.map_err(|e| into_fetch_error(&template.source, e))
    }
}

fn into_fetch_error(locator: &str, err: ScmError) -> FetchError {
    match err {
        ScmError::NotFound(_) => FetchError::NotFound(locator.to_string()),
        ScmError::InvalidSource(_) => FetchError::InvalidSource {
            locator: locator.to_string(),
            reason: "expected host/org/repo/path[@ref]".to_string(),
        },
        other => FetchError::Transport {
            locator: locator.to_string(),
            message: other.to_string(),
        },
    }
}
