//! Repository contents endpoint

use crate::ScmClient;
use crate::error::Result;

impl ScmClient {
    // =============================================================================
    // Repository Contents
    // =============================================================================

    /// Fetch the raw bytes of a file in a repository
    ///
    /// # Arguments
    /// * `org` - Repository owner
    /// * `repo` - Repository name
    /// * `path` - File path inside the repository
    /// * `reference` - Branch, tag or commit; the default branch when `None`
    pub async fn fetch_contents(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Vec<u8>> {
        let url = format!(
            "{}/api/v3/repos/{}/{}/contents/{}",
            self.base_url,
            org,
            repo,
            path.trim_start_matches('/')
        );

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.raw")
            .header(reqwest::header::USER_AGENT, "sluice");

        if let Some(reference) = reference {
            request = request.query(&[("ref", reference)]);
        }

        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
        }

        tracing::debug!("Fetching {}/{}/{} at {:?}", org, repo, path, reference);

        let response = request.send().await?;
        self.handle_raw_response(response, &format!("{}/{}/{}", org, repo, path))
            .await
    }
}
