//! Chat-completion client.
//!
//! One POST per call, no retries and no caching: two identical prompts
//! always reach the endpoint twice. Every failure, whether transport,
//! HTTP status or payload, comes back as [`CourseCraftError::Generation`]
//! carrying the failure message.

use std::time::Duration;

use coursecraft_shared::{AppConfig, CourseCraftError, Result, validate_api_key};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::prompt::OutputShape;

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("CourseCraft/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Endpoint, credentials and model selection for the completion client.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// API base URL; `/chat/completions` is appended.
    pub base_url: String,
    pub api_key: String,
    /// Model for free text and CSV.
    pub model: String,
    /// Model for slide outlines.
    pub slides_model: String,
    pub timeout_secs: u64,
}

impl GenerationOptions {
    /// Resolve options from config and the API key env var it names.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        Ok(Self {
            base_url: config.openai.base_url.clone(),
            api_key,
            model: config.openai.model.clone(),
            slides_model: config.openai.slides_model.clone(),
            timeout_secs: config.openai.timeout_secs,
        })
    }

    /// Model used for the given output shape.
    pub fn model_for(&self, shape: OutputShape) -> &str {
        match shape {
            OutputShape::SlideOutline => &self.slides_model,
            OutputShape::FreeText | OutputShape::CsvTable => &self.model,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error body returned by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Build the message list: optional system role, then the user prompt.
fn build_messages(prompt: &str, system_role: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(role) = system_role {
        messages.push(ChatMessage::system(role));
    }
    messages.push(ChatMessage::user(prompt));
    messages
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: Client,
    endpoint: String,
    api_key: String,
    options: GenerationOptions,
}

impl GenerationClient {
    pub fn new(options: GenerationOptions) -> Result<Self> {
        let endpoint = format!("{}/chat/completions", options.base_url.trim_end_matches('/'));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| {
                CourseCraftError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: options.api_key.clone(),
            options,
        })
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate text with the default model.
    pub async fn generate(&self, prompt: &str, system_role: Option<&str>) -> Result<String> {
        self.generate_with_model(&self.options.model, prompt, system_role)
            .await
    }

    /// Generate text for a given output shape, picking the shape's model.
    pub async fn generate_for(
        &self,
        shape: OutputShape,
        prompt: &str,
        system_role: Option<&str>,
    ) -> Result<String> {
        self.generate_with_model(self.options.model_for(shape), prompt, system_role)
            .await
    }

    /// Send one completion request and return `choices[0].message.content`.
    #[instrument(skip(self, prompt, system_role), fields(prompt_len = prompt.len()))]
    pub async fn generate_with_model(
        &self,
        model: &str,
        prompt: &str,
        system_role: Option<&str>,
    ) -> Result<String> {
        let request = CompletionRequest {
            model,
            messages: build_messages(prompt, system_role),
        };

        debug!(endpoint = %self.endpoint, "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "completion request failed");
                CourseCraftError::Generation(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            warn!(%status, %message, "completion endpoint returned an error");
            return Err(CourseCraftError::Generation(format!("HTTP {status}: {message}")));
        }

        let payload: CompletionResponse = response.json().await.map_err(|e| {
            CourseCraftError::Generation(format!("invalid completion response: {e}"))
        })?;

        let text = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                CourseCraftError::Generation("completion response contained no content".into())
            })?;

        info!(chars = text.len(), "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options_for(server: &MockServer) -> GenerationOptions {
        GenerationOptions {
            base_url: format!("{}/v1/", server.uri()),
            api_key: "sk-test".into(),
            model: "gpt-3.5-turbo".into(),
            slides_model: "gpt-4".into(),
            timeout_secs: 5,
        }
    }

    fn completion(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
        })
    }

    #[test]
    fn messages_with_and_without_system_role() {
        let with_role = build_messages("hi", Some("expert"));
        assert_eq!(with_role, vec![ChatMessage::system("expert"), ChatMessage::user("hi")]);

        let without = build_messages("hi", None);
        assert_eq!(without, vec![ChatMessage::user("hi")]);
    }

    #[test]
    fn request_serializes_to_openai_shape() {
        let request = CompletionRequest {
            model: "gpt-4",
            messages: build_messages("hello", Some("sys")),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn model_selection_by_shape() {
        let opts = GenerationOptions {
            base_url: "http://localhost".into(),
            api_key: "k".into(),
            model: "small".into(),
            slides_model: "large".into(),
            timeout_secs: 1,
        };
        assert_eq!(opts.model_for(OutputShape::FreeText), "small");
        assert_eq!(opts.model_for(OutputShape::CsvTable), "small");
        assert_eq!(opts.model_for(OutputShape::SlideOutline), "large");
    }

    #[tokio::test]
    async fn generate_returns_first_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-3.5-turbo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Stents work.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GenerationClient::new(options_for(&server)).unwrap();
        let text = client.generate("question", Some("role")).await.unwrap();
        assert_eq!(text, "Stents work.");
    }

    #[tokio::test]
    async fn identical_prompts_are_not_cached() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("again")))
            .expect(2)
            .mount(&server)
            .await;

        let client = GenerationClient::new(options_for(&server)).unwrap();
        client.generate("same", None).await.unwrap();
        client.generate("same", None).await.unwrap();
    }

    #[tokio::test]
    async fn slide_shape_uses_slides_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Intro: hi")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GenerationClient::new(options_for(&server)).unwrap();
        let text = client
            .generate_for(OutputShape::SlideOutline, "slides", None)
            .await
            .unwrap();
        assert_eq!(text, "Intro: hi");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_generation_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let client = GenerationClient::new(options_for(&server)).unwrap();
        let err = client.generate("q", None).await.unwrap_err();
        match err {
            CourseCraftError::Generation(message) => {
                assert!(message.contains("401"));
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("expected Generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = GenerationClient::new(options_for(&server)).unwrap();
        assert!(matches!(
            client.generate("q", None).await,
            Err(CourseCraftError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error_value() {
        let opts = GenerationOptions {
            base_url: "http://127.0.0.1:9".into(),
            api_key: "k".into(),
            model: "m".into(),
            slides_model: "m".into(),
            timeout_secs: 2,
        };
        let client = GenerationClient::new(opts).unwrap();
        assert!(matches!(
            client.generate("q", None).await,
            Err(CourseCraftError::Generation(_))
        ));
    }
}
