//! Generator boundary
//!
//! [`NarrativeGenerator`] is the only asynchronous seam in the workspace.
//! Anything it returns is a candidate for the validator, never final text.

use crate::error::GenerationError;
use crate::prompt::NarrativeRequest;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// External text generator
///
/// Implement this trait to plug in a model service. Implementations need
/// not bound their own latency; the narrator wraps every call in a timeout.
#[async_trait::async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Produce a candidate narrative
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, GenerationError>;

    /// Name used in logs
    fn name(&self) -> &str {
        "generator"
    }
}

/// Chat-completions client for OpenAI-compatible services
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    api_key: String,
    base_url: String,
    request_timeout: Duration,
    client: Client,
}

impl OpenAiGenerator {
    /// Create a client
    ///
    /// # Errors
    /// - `GenerationError::MissingApiKey` for a blank key
    /// - `GenerationError::Transport` if the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(GenerationError::MissingApiKey {
                provider: "openai".to_string(),
            });
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            client: Client::builder().build()?,
        })
    }

    /// With service base URL, e.g. a self-hosted gateway
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// With per-request HTTP timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Base URL in use
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| GenerationError::Config("API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl NarrativeGenerator for OpenAiGenerator {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, GenerationError> {
        let body = ChatRequest::from_request(request);
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(url = %url, model = %request.sampling.model, "calling chat completions");

        let resp = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(GenerationError::status(status.as_u16(), text));
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyReply)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatRequest<'a> {
    fn from_request(request: &'a NarrativeRequest) -> Self {
        Self {
            model: &request.sampling.model,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_tokens: request.sampling.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Sampling;

    #[test]
    fn blank_key_is_rejected() {
        let err = OpenAiGenerator::new("  ").unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey { .. }));
    }

    #[test]
    fn base_url_is_normalized() {
        let g = OpenAiGenerator::new("sk-test").unwrap().with_base_url("http://localhost:8080/v1/");
        assert_eq!(g.base_url(), "http://localhost:8080/v1");
        assert_eq!(g.name(), "openai");
    }

    #[test]
    fn request_body_carries_sampling() {
        let request = NarrativeRequest {
            system: "sys".to_string(),
            user: "usr".to_string(),
            sampling: Sampling::default(),
        };
        let body = serde_json::to_value(ChatRequest::from_request(&request)).unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
    }

    #[test]
    fn reply_with_null_content_parses() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).unwrap();
        assert_eq!(parsed.choices[0].message.content, None);
    }
}
