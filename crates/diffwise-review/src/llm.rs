use std::time::Duration;

use async_trait::async_trait;
use diffwise_core::{DiffwiseError, LlmConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use diffwise_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Review this code");
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// A message with the `user` role.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use diffwise_review::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// Anything that can answer a chat completion request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request one completion and return the content of the first choice.
    ///
    /// `Ok(None)` means the provider answered successfully but without any
    /// text.
    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<Option<String>, DiffwiseError>;
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint:
/// OpenAI, Azure-style proxies, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use diffwise_core::LlmConfig;
/// use diffwise_review::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DiffwiseError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, DiffwiseError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DiffwiseError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Full URL of the chat completions endpoint.
    pub fn endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com")
            .trim_end_matches('/');
        format!("{base_url}/v1/chat/completions")
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<Option<String>, DiffwiseError> {
        let url = self.endpoint();
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }
        request = request.header("Content-Type", "application/json");

        debug!(%url, model, "requesting chat completion");
        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| DiffwiseError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body_text));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| DiffwiseError::Llm(format!("failed to parse response: {e}")))?;

        Ok(completion.first_content())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletion {
    fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<serde_json::Value>,
}

/// Turn an error response into [`DiffwiseError::CompletionApi`].
///
/// OpenAI-style bodies (`{"error": {"message", "type", "code"}}`) fill the
/// structured fields; anything else keeps the raw body as the message.
fn api_error(status: u16, body: &str) -> DiffwiseError {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope.error.code.and_then(|c| match c {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            });
            DiffwiseError::CompletionApi {
                status,
                code,
                kind: envelope.error.kind,
                message: envelope
                    .error
                    .message
                    .unwrap_or_else(|| body.trim().to_string()),
            }
        }
        Err(_) => DiffwiseError::CompletionApi {
            status,
            code: None,
            kind: None,
            message: body.trim().to_string(),
        },
    }
}
