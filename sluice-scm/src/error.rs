//! Error types for the source-control client

use thiserror::Error;

/// Result type alias for source-control operations
pub type Result<T> = std::result::Result<T, ScmError>;

/// Errors that can occur when talking to the source-control host
#[derive(Debug, Error)]
pub enum ScmError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Host returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the host
        message: String,
    },

    /// No file at the requested path and reference
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A template locator that cannot be split into host, org, repo and path
    #[error("Invalid template source {0}: expected host/org/repo/path[@ref]")]
    InvalidSource(String),
}

impl ScmError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(ScmError::NotFound("a/b".to_string()).is_not_found());
        assert!(ScmError::api_error(404, "missing").is_not_found());
        assert!(!ScmError::api_error(500, "boom").is_not_found());
    }
}
