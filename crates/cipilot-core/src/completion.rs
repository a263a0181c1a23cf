//! Chat-completion client for the hosted language model.
//!
//! The pipelines only see the [`CompletionService`] trait: text in, text out.
//! [`AzureOpenAiClient`] is the production implementation; in-memory fakes
//! live in [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompletionConfig;

/// Errors from the completion service.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Transport-level failure (connect, TLS, body decode)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Service answered with a non-success status
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Service answered without any message content
    #[error("completion response had no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Http(err.to_string())
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Requested shape of the model's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// A single chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            response_format: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Content of the first message with the given role, if any.
    pub fn content_of(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// Opaque text transformation backed by a hosted model.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one request and return the assistant's reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a CompletionRequest,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

/// Azure OpenAI chat-completions client.
pub struct AzureOpenAiClient {
    config: CompletionConfig,
    http_client: reqwest::Client,
}

impl AzureOpenAiClient {
    /// Create a new client.
    ///
    /// No request timeout is configured; an unresponsive service stalls the
    /// caller.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("cipilot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

#[async_trait]
impl CompletionService for AzureOpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        debug!(
            deployment = %self.config.deployment,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let body = ChatCompletionBody {
            model: &self.config.deployment,
            request,
        };

        let response = self
            .http_client
            .post(self.url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        extract_content(parsed)
    }
}

fn extract_content(response: ChatCompletionResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_config() -> CompletionConfig {
        CompletionConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "secret".to_string(),
            api_version: "2024-10-21".to_string(),
            deployment: "gpt-5-chat".to_string(),
        }
    }

    #[test]
    fn test_url_joins_endpoint_and_deployment() {
        let client = AzureOpenAiClient::new(sample_config()).expect("client");
        assert_eq!(
            client.url(),
            "https://example.openai.azure.com/openai/deployments/gpt-5-chat/chat/completions?api-version=2024-10-21"
        );
    }

    #[test]
    fn test_body_serializes_optional_fields_only_when_set() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        let body = ChatCompletionBody {
            model: "gpt-5-chat",
            request: &request,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-5-chat",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn test_body_carries_json_mode_and_temperature() {
        let request = CompletionRequest::new(vec![ChatMessage::system("only json")])
            .with_temperature(0.5)
            .with_response_format(ResponseFormat::JsonObject);
        let value = serde_json::to_value(ChatCompletionBody {
            model: "m",
            request: &request,
        })
        .unwrap();
        assert_eq!(value["response_format"], json!({"type": "json_object"}));
        assert_eq!(value["temperature"], json!(0.5));
        assert_eq!(value["messages"][0]["role"], "system");
    }

    #[test]
    fn test_extract_content_takes_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        }))
        .unwrap();
        assert_eq!(extract_content(response).unwrap(), "first");
    }

    #[test]
    fn test_extract_content_rejects_empty_choices() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            extract_content(response),
            Err(CompletionError::EmptyResponse)
        ));
    }

    #[test]
    fn test_content_of_finds_role() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("sys"),
            ChatMessage::user("usr"),
        ]);
        assert_eq!(request.content_of(Role::System), Some("sys"));
        assert_eq!(request.content_of(Role::User), Some("usr"));
        assert_eq!(request.content_of(Role::Assistant), None);
    }
}
