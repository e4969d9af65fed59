//! Sluice Source-Control Client
//!
//! Reads template files from a GitHub-compatible source-control host and
//! plugs them into the compiler as a [`TemplateFetcher`].
//!
//! # Example
//!
//! ```no_run
//! use sluice_scm::ScmClient;
//!
//! #[tokio::main]
//! async fn main() -> sluice_scm::Result<()> {
//!     let client = ScmClient::new("https://github.example.com", Some("token".to_string()));
//!
//!     let bytes = client
//!         .fetch_contents("octocat", "templates", "gradle.yml", Some("main"))
//!         .await?;
//!
//!     println!("{} bytes", bytes.len());
//!     Ok(())
//! }
//! ```
//!
//! [`TemplateFetcher`]: sluice_compiler::TemplateFetcher

pub mod error;
mod contents;
mod fetcher;
mod source;

pub use error::{Result, ScmError};
pub use fetcher::ScmFetcher;
pub use source::TemplateSource;

use reqwest::Client;

/// HTTP client for the source-control host's contents API
#[derive(Debug, Clone)]
pub struct ScmClient {
    /// Base URL of the host (e.g., "https://github.example.com")
    base_url: String,
    /// Access token sent as `Authorization: token ...`
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl ScmClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use sluice_scm::ScmClient;
    ///
    /// let client = ScmClient::new("https://github.example.com/", None);
    /// assert_eq!(client.base_url(), "https://github.example.com");
    /// ```
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, token: Option<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Get the base URL of the host
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and return the raw body
    async fn handle_raw_response(&self, response: reqwest::Response, what: &str) -> Result<Vec<u8>> {
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScmError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ScmError::api_error(status.as_u16(), error_message(&error_text)));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// GitHub wraps errors as `{"message": "..."}`; fall back to the raw body
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}
