//! LLM error types

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`super::ChatCompletion`] implementation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Credentials are missing or unusable. Raised before any network call.
    #[error("LLM is not configured: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The backend answered successfully but the envelope could not be read.
    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),

    /// The backend answered successfully with no text.
    #[error("LLM returned empty content")]
    EmptyResponse,
}

impl LlmError {
    /// Whether the failure happened on the wire or at the backend, as opposed
    /// to local configuration or empty output.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Api { .. } | Self::InvalidResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(LlmError::Timeout(Duration::from_secs(5)).is_transport());
        assert!(
            LlmError::Api {
                status: 401,
                message: "bad key".to_owned()
            }
            .is_transport()
        );
        assert!(LlmError::InvalidResponse("not json".to_owned()).is_transport());
        assert!(!LlmError::Configuration("no endpoint".to_owned()).is_transport());
        assert!(!LlmError::EmptyResponse.is_transport());
    }
}
