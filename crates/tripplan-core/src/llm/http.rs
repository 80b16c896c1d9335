//! Chat-completion client for Azure OpenAI deployments and generic
//! OpenAI-compatible endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{ChatCompletion, LlmCredentials, LlmError};

/// Request timeout used by [`HttpChatClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// `api-version` query parameter sent to Azure deployments.
pub const AZURE_API_VERSION: &str = "2024-10-21";

const TEMPERATURE: f32 = 0.5;

/// Longest slice of an error body carried into [`LlmError::Api`].
const MAX_ERROR_BODY: usize = 512;

/// How a request is routed and authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// `/openai/deployments/{model}/chat/completions`, `api-key` header.
    Azure,
    /// `/v1/chat/completions`, bearer token.
    OpenAi,
}

/// A fully resolved chat-completions URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub kind: EndpointKind,
    pub url: Url,
}

/// Work out where to send a request for `credentials`.
///
/// Azure routing follows `credentials.azure` when set, otherwise it is
/// inferred from an `*.openai.azure.com` / `*.cognitiveservices.azure.com`
/// host.
pub fn resolve_endpoint(credentials: &LlmCredentials) -> Result<ResolvedEndpoint, LlmError> {
    let raw = credentials.endpoint.trim();
    let mut url = Url::parse(raw)
        .map_err(|e| LlmError::Configuration(format!("endpoint {raw:?} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LlmError::Configuration(format!(
            "endpoint {raw:?} must use http or https"
        )));
    }

    let kind = match credentials.azure {
        Some(true) => EndpointKind::Azure,
        Some(false) => EndpointKind::OpenAi,
        None => {
            let host = url.host_str().unwrap_or_default();
            if host.ends_with(".openai.azure.com")
                || host.ends_with(".cognitiveservices.azure.com")
            {
                EndpointKind::Azure
            } else {
                EndpointKind::OpenAi
            }
        }
    };

    let path = url.path().trim_end_matches('/').to_owned();
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            LlmError::Configuration(format!("endpoint {raw:?} cannot carry a path"))
        })?;
        segments.pop_if_empty();
        match kind {
            EndpointKind::Azure => {
                segments.extend([
                    "openai",
                    "deployments",
                    credentials.model_or_default(),
                    "chat",
                    "completions",
                ]);
            }
            EndpointKind::OpenAi if path.ends_with("/chat/completions") => {}
            EndpointKind::OpenAi => {
                if !path.ends_with("/v1") {
                    segments.push("v1");
                }
                segments.extend(["chat", "completions"]);
            }
        }
    }
    if kind == EndpointKind::Azure {
        url.query_pairs_mut()
            .append_pair("api-version", AZURE_API_VERSION);
    }

    Ok(ResolvedEndpoint { kind, url })
}

/// [`ChatCompletion`] over HTTPS using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: Client,
    timeout: Duration,
}

impl HttpChatClient {
    /// Build a client with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self, LlmError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, timeout })
    }

    fn build_request_body(
        kind: EndpointKind,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Value {
        let mut body = serde_json::json!({
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": TEMPERATURE,
        });
        // Azure takes the deployment from the URL path.
        if kind == EndpointKind::OpenAi {
            body["model"] = Value::from(model);
        }
        body
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Network(err)
        }
    }
}

#[async_trait]
impl ChatCompletion for HttpChatClient {
    async fn complete(
        &self,
        credentials: &LlmCredentials,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, LlmError> {
        credentials.check_present()?;
        let endpoint = resolve_endpoint(credentials)?;
        let model = credentials.model_or_default();

        info!(model, kind = ?endpoint.kind, "requesting chat completion");

        let body = Self::build_request_body(endpoint.kind, model, system_prompt, user_prompt);
        let request = self.http.post(endpoint.url).json(&body);
        let request = match endpoint.kind {
            EndpointKind::Azure => request.header("api-key", credentials.api_key.trim()),
            EndpointKind::OpenAi => request.bearer_auth(credentials.api_key.trim()),
        };

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "chat completion failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("unexpected response envelope: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(content_text)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        debug!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<Value>,
}

/// Flatten message content, which is either a string or a list of parts
/// carrying `text`.
fn content_text(content: Value) -> String {
    match content {
        Value::String(s) => s,
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_owned();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(endpoint: &str) -> LlmCredentials {
        LlmCredentials::new(endpoint, "key")
    }

    #[test]
    fn azure_inferred_from_host() {
        let ep = resolve_endpoint(&creds("https://contoso.openai.azure.com/")).unwrap();
        assert_eq!(ep.kind, EndpointKind::Azure);
        assert_eq!(
            ep.url.as_str(),
            format!(
                "https://contoso.openai.azure.com/openai/deployments/gpt-4.1/chat/completions?api-version={AZURE_API_VERSION}"
            )
        );
    }

    #[test]
    fn azure_uses_deployment_name() {
        let c = creds("https://contoso.cognitiveservices.azure.com").with_model("trips-prod");
        let ep = resolve_endpoint(&c).unwrap();
        assert_eq!(ep.kind, EndpointKind::Azure);
        assert!(ep.url.path().ends_with("/openai/deployments/trips-prod/chat/completions"));
    }

    #[test]
    fn explicit_flag_overrides_inference() {
        let mut c = creds("https://contoso.openai.azure.com");
        c.azure = Some(false);
        assert_eq!(resolve_endpoint(&c).unwrap().kind, EndpointKind::OpenAi);

        let mut c = creds("http://localhost:8080");
        c.azure = Some(true);
        assert_eq!(resolve_endpoint(&c).unwrap().kind, EndpointKind::Azure);
    }

    #[test]
    fn openai_paths() {
        let cases = [
            ("https://api.openai.com", "/v1/chat/completions"),
            ("https://api.openai.com/", "/v1/chat/completions"),
            ("https://api.openai.com/v1", "/v1/chat/completions"),
            ("https://gateway.local/llm/v1/", "/llm/v1/chat/completions"),
            ("https://gateway.local/v1/chat/completions", "/v1/chat/completions"),
        ];
        for (endpoint, path) in cases {
            let ep = resolve_endpoint(&creds(endpoint)).unwrap();
            assert_eq!(ep.kind, EndpointKind::OpenAi, "{endpoint}");
            assert_eq!(ep.url.path(), path, "{endpoint}");
            assert!(ep.url.query().is_none());
        }
    }

    #[test]
    fn invalid_endpoint_is_configuration_error() {
        assert!(matches!(
            resolve_endpoint(&creds("not a url")),
            Err(LlmError::Configuration(_))
        ));
        assert!(matches!(
            resolve_endpoint(&creds("ftp://example.com")),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn request_body_shape() {
        let body =
            HttpChatClient::build_request_body(EndpointKind::OpenAi, "gpt-4.1", "sys", "usr");
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "usr");

        let azure = HttpChatClient::build_request_body(EndpointKind::Azure, "dep", "sys", "usr");
        assert!(azure.get("model").is_none());
    }

    #[test]
    fn content_parts_are_joined() {
        let parts = serde_json::json!([
            { "type": "text", "text": "{\"days\":" },
            { "type": "text", "text": "[]}" },
        ]);
        assert_eq!(content_text(parts), "{\"days\":[]}");
        assert_eq!(content_text(Value::Null), "");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ąąą", 3), "ą…");
    }
}
