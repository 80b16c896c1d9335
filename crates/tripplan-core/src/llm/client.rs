//! The `ChatCompletion` trait and the per-user credentials it consumes.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LlmError;

/// Model (or Azure deployment) used when the caller supplies none.
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// A user's chat-completion credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmCredentials {
    /// Service base URL, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    /// Model id or Azure deployment name; [`DEFAULT_MODEL`] when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// Force (or forbid) Azure routing. Inferred from the endpoint host when
    /// `None`.
    #[serde(default)]
    pub azure: Option<bool>,
}

impl LlmCredentials {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: None,
            azure: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// The configured model, or [`DEFAULT_MODEL`] when unset or blank.
    pub fn model_or_default(&self) -> &str {
        match self.model.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => DEFAULT_MODEL,
        }
    }

    /// Reject credentials that cannot possibly work, without touching the
    /// network.
    pub fn check_present(&self) -> Result<(), LlmError> {
        if self.endpoint.trim().is_empty() {
            return Err(LlmError::Configuration(
                "endpoint is not configured for this user".to_owned(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Configuration(
                "API key is not configured for this user".to_owned(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for LlmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmCredentials")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("azure", &self.azure)
            .finish()
    }
}

/// A chat-completion backend.
///
/// One call is one outbound request: implementations do not retry or cache.
/// The trait is object-safe so callers can hold `Arc<dyn ChatCompletion>`.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send a system and a user message and return the assistant's text.
    ///
    /// Fails with [`LlmError::Configuration`] before any network call when
    /// the endpoint or API key is blank, and with [`LlmError::EmptyResponse`]
    /// when the backend succeeds without returning text.
    async fn complete(
        &self,
        credentials: &LlmCredentials,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, LlmError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ChatCompletion) {}
};
