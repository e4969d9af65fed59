//! Remote template locators

use crate::error::{Result, ScmError};

/// A parsed `host/org/repo/path[@ref]` locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub host: String,
    pub org: String,
    pub repo: String,
    pub path: String,
    /// Branch, tag or commit; the default branch when absent
    pub reference: Option<String>,
}

impl TemplateSource {
    /// Parse a remote template locator
    ///
    /// # Example
    /// ```
    /// use sluice_scm::TemplateSource;
    ///
    /// let source = TemplateSource::parse("github.example.com/foo/bar/ci/gradle.yml@v1").unwrap();
    /// assert_eq!(source.path, "ci/gradle.yml");
    /// assert_eq!(source.reference.as_deref(), Some("v1"));
    /// ```
    pub fn parse(locator: &str) -> Result<Self> {
        let invalid = || ScmError::InvalidSource(locator.to_string());

        // Only an `@` in the last segment separates the reference
        let (location, reference) = match locator.rsplit_once('@') {
            Some((location, reference)) if !reference.contains('/') => {
                (location, Some(reference.to_string()))
            }
            _ => (locator, None),
        };

        let mut parts = location.splitn(4, '/');
        let host = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let org = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let path = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

        if reference.as_deref() == Some("") {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            org: org.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            reference,
        })
    }
}
