//! Error type for the generation pipeline.

use thiserror::Error;

use crate::itinerary::parser::ParseError;
use crate::llm::LlmError;
use crate::trip::ValidationError;

/// Why a generation request did not produce a committed itinerary.
///
/// Every variant except [`GenerateError::Storage`] is raised before the
/// replace transaction opens, so the trip's previous itinerary is untouched.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid trip: {0}")]
    Validation(#[from] ValidationError),

    #[error("trip {0} not found")]
    TripNotFound(i64),

    /// Endpoint or API key missing or unusable.
    #[error("LLM is not configured: {0}")]
    Configuration(String),

    #[error("LLM request failed: {0}")]
    Transport(#[source] LlmError),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("could not read the itinerary from the LLM response: {0}")]
    Parse(#[from] ParseError),

    /// Replace transaction failed and was rolled back.
    #[error("failed to save itinerary: {0:#}")]
    Storage(anyhow::Error),

    #[error("generation cancelled")]
    Cancelled,
}

impl GenerateError {
    /// Stable snake_case name, used as the `kind` field in API errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::TripNotFound(_) => "not_found",
            Self::Configuration(_) => "configuration",
            Self::Transport(_) => "transport",
            Self::EmptyResponse => "empty_response",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
            Self::Cancelled => "cancelled",
        }
    }

    /// The request was well-formed and the model simply produced nothing
    /// usable; running it again may succeed.
    pub fn is_retryable_by_user(&self) -> bool {
        matches!(self, Self::EmptyResponse | Self::Parse(_))
    }
}

impl From<LlmError> for GenerateError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => Self::Configuration(msg),
            LlmError::EmptyResponse => Self::EmptyResponse,
            other => Self::Transport(other),
        }
    }
}
