//! Error types for the Top Tokens Tracker

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when fetching the ranking from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No response reached us (connection refused, timeout, DNS...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response arrived but its status was not 2xx or its body was unusable
    #[error("Response error (HTTP {status}): {message}")]
    Response { status: u16, message: String },
}

/// Which side of the wire a fetch failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Response,
}

impl ProviderError {
    /// Creates a Response error
    pub fn response(status: u16, message: impl Into<String>) -> Self {
        Self::Response {
            status,
            message: message.into(),
        }
    }

    /// Classifies the error for logs, events and metrics
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Network(_) => FailureKind::Network,
            ProviderError::Response { .. } => FailureKind::Response,
        }
    }

    /// Message shown to the user when this error takes over the display
    ///
    /// Response errors carry the backend's own message (or the generic HTTP
    /// fallback); network errors use the transport's description.
    pub fn display_message(&self) -> String {
        match self {
            ProviderError::Network(e) => e.to_string(),
            ProviderError::Response { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_error_message_is_backend_text() {
        let err = ProviderError::response(500, "rate limited");
        assert_eq!(err.kind(), FailureKind::Response);
        assert_eq!(err.display_message(), "rate limited");
        assert_eq!(err.to_string(), "Response error (HTTP 500): rate limited");
    }
}
