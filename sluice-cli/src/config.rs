//! CLI configuration
//!
//! Decides where templates are read from and builds the compiler.

use sluice_compiler::{Compiler, FileFetcher, TemplateFetcher};
use sluice_scm::{ScmClient, ScmFetcher};
use std::sync::Arc;

/// Source-control settings for `--scm-url`
#[derive(Debug, Clone)]
pub struct ScmConfig {
    pub url: String,
    pub token: Option<String>,
    pub org: String,
    pub repo: String,
    pub commit: String,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory templates are read from without a host
    pub templates_dir: String,

    /// Limit on nested template calls
    pub max_template_depth: usize,

    /// Fetch templates from this host instead of `templates_dir`
    pub scm: Option<ScmConfig>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_template_depth == 0 {
            anyhow::bail!("max_template_depth must be greater than 0");
        }

        if let Some(scm) = &self.scm {
            if !scm.url.starts_with("http://") && !scm.url.starts_with("https://") {
                anyhow::bail!("scm url must start with http:// or https://");
            }
            if scm.org.is_empty() || scm.repo.is_empty() {
                anyhow::bail!("--org and --repo are required with --scm-url");
            }
        }

        Ok(())
    }

    pub fn fetcher(&self) -> Arc<dyn TemplateFetcher> {
        match &self.scm {
            Some(scm) => Arc::new(ScmFetcher::new(
                ScmClient::new(scm.url.as_str(), scm.token.clone()),
                scm.org.as_str(),
                scm.repo.as_str(),
                scm.commit.as_str(),
            )),
            None => Arc::new(FileFetcher::new(self.templates_dir.as_str())),
        }
    }

    pub fn compiler(&self) -> Compiler {
        Compiler::new(self.fetcher()).with_max_template_depth(self.max_template_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            templates_dir: "./templates".to_string(),
            max_template_depth: 5,
            scm: None,
        }
    }

    #[test]
    fn test_directory_config_is_valid() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.compiler().max_template_depth(), 5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = config();
        config.max_template_depth = 0;
        assert!(config.validate().is_err());
        config.max_template_depth = 2;

        config.scm = Some(ScmConfig {
            url: "github.example.com".to_string(),
            token: None,
            org: "octocat".to_string(),
            repo: "hello".to_string(),
            commit: "HEAD".to_string(),
        });
        assert!(config.validate().is_err());

        if let Some(scm) = config.scm.as_mut() {
            scm.url = "https://github.example.com".to_string();
        }
        assert!(config.validate().is_ok());

        if let Some(scm) = config.scm.as_mut() {
            scm.repo.clear();
        }
        assert!(config.validate().is_err());
    }
}
