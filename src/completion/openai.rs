//! OpenAI text completion backend (`POST /v1/completions`).

use super::{CompleteRequestSettings, TextCompletion};
use crate::transport::{HttpOptions, HttpReply, HttpTransport};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const COMPLETIONS_PATH: &str = "/v1/completions";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f64,
    top_p: f64,
    presence_penalty: f64,
    frequency_penalty: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

pub struct OpenAiTextCompletion {
    transport: HttpTransport,
    model: String,
}

impl OpenAiTextCompletion {
    pub fn builder() -> OpenAiTextCompletionBuilder {
        OpenAiTextCompletionBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn parse_reply(reply: HttpReply) -> Result<String> {
        if !reply.is_success() {
            return Err(Error::Remote {
                status: reply.status,
                class: classify_status(reply.status).to_string(),
                message: error_message_from_body(&reply.body),
            });
        }

        let json: serde_json::Value = serde_json::from_str(&reply.body)?;
        json.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Remote {
                status: reply.status,
                class: "invalid_response".to_string(),
                message: "response has no choices[0].text".to_string(),
            })
    }
}

#[async_trait]
impl TextCompletion for OpenAiTextCompletion {
    async fn complete(&self, prompt: &str, settings: &CompleteRequestSettings) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: settings.temperature,
            top_p: settings.top_p,
            presence_penalty: settings.presence_penalty,
            frequency_penalty: settings.frequency_penalty,
            max_tokens: settings.max_tokens,
            stop: Some(settings.stop_sequences.as_slice()).filter(|s| !s.is_empty()),
        };
        let body = serde_json::to_value(&request)?;

        info!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Requesting text completion"
        );
        let reply = self.transport.post_json(COMPLETIONS_PATH, &body).await?;
        Self::parse_reply(reply)
    }
}

/// Map an HTTP status to a coarse error class.
pub(crate) fn classify_status(status: u16) -> &'static str {
    match status {
        401 => "authentication",
        403 => "permission_denied",
        404 => "not_found",
        429 => "rate_limited",
        500..=599 => "server_error",
        _ => "http_error",
    }
}

// Prefer the common OpenAI-style error shape, else the raw body.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

pub struct OpenAiTextCompletionBuilder {
    model: Option<String>,
    api_key: Option<String>,
    org_id: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiTextCompletionBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            org_id: None,
            base_url: None,
            timeout: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-request timeout; overrides `SK_HTTP_TIMEOUT_SECS`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the backend. The API key falls back to `OPENAI_API_KEY`, then to empty.
    ///
    /// Fails with [`Error::Configuration`] if the `SK_HTTP_*`/`SK_PROXY_URL`
    /// environment holds malformed values.
    pub fn build(self) -> Result<OpenAiTextCompletion> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::configuration("Model must be specified"))?;
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut options = HttpOptions::from_env()?;
        if let Some(timeout) = self.timeout {
            options = options.timeout(timeout);
        }
        let transport =
            HttpTransport::new(&base_url, &api_key, self.org_id.as_deref(), &options)?;
        Ok(OpenAiTextCompletion { transport, model })
    }
}

impl Default for OpenAiTextCompletionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401), "authentication");
        assert_eq!(classify_status(403), "permission_denied");
        assert_eq!(classify_status(429), "rate_limited");
        assert_eq!(classify_status(503), "server_error");
        assert_eq!(classify_status(400), "http_error");
    }

    #[test]
    fn test_error_message_prefers_structured_body() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message_from_body(body), "Incorrect API key provided");
        assert_eq!(error_message_from_body(" upstream down \n"), "upstream down");
    }

    #[test]
    fn test_parse_reply_extracts_first_choice() {
        let reply = HttpReply {
            status: 200,
            body: r#"{"choices":[{"text":"Energy is conserved.","index":0},{"text":"ignored"}]}"#
                .to_string(),
        };
        assert_eq!(
            OpenAiTextCompletion::parse_reply(reply).unwrap(),
            "Energy is conserved."
        );
    }

    #[test]
    fn test_parse_reply_without_choices_is_invalid_response() {
        let reply = HttpReply {
            status: 200,
            body: r#"{"choices":[]}"#.to_string(),
        };
        let err = OpenAiTextCompletion::parse_reply(reply).unwrap_err();
        assert_eq!(err.remote_class(), Some("invalid_response"));
    }

    #[test]
    fn test_request_omits_empty_stop() {
        let request = CompletionRequest {
            model: "text-davinci-003",
            prompt: "hi",
            temperature: 0.0,
            top_p: 0.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            max_tokens: 256,
            stop: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("stop").is_none());
        assert_eq!(json["model"], "text-davinci-003");
    }

    #[test]
    fn test_builder_requires_model() {
        let err = OpenAiTextCompletion::builder().api_key("k").build().err().unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_builder_keeps_model_and_base_url() {
        let completion = OpenAiTextCompletion::builder()
            .model("text-davinci-003")
            .api_key("k")
            .base_url("http://127.0.0.1:9/")
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(completion.model(), "text-davinci-003");
        assert_eq!(completion.transport.base_url(), "http://127.0.0.1:9");
    }
}
