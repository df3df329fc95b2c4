use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::conversation::{Message, ToolCallRequest};
use crate::tool::ToolSchema;
use super::openai::{GROQ_BASE_URL, OpenAIClient};

/// How the model may use the tools it is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call a tool
    #[default]
    Auto,
    /// The model must answer in text
    None,
    /// The model must call at least one tool
    Required,
}

/// Input for an LLM request.
#[derive(Debug, Clone)]
pub struct LLMInput {
    /// The model to use
    pub model: String,
    /// The full conversation so far
    pub messages: Vec<Message>,
    /// Available tools for the LLM
    pub tools: Vec<ToolSchema>,
    /// Tool selection mode
    pub tool_choice: ToolChoice,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Output from an LLM response: one assistant message.
#[derive(Debug, Clone, Default)]
pub struct LLMOutput {
    /// Text of the reply, if any
    pub content: Option<String>,
    /// Tool calls requested by the reply, in the order given by the model
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the response finished
    pub finish_reason: FinishReason,
    /// Token usage statistics
    pub usage: Usage,
}

impl LLMOutput {
    /// Creates a plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: FinishReason::Stop,
            ..Self::default()
        }
    }

    /// Creates a reply that only requests tool calls.
    pub fn tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls,
            finish_reason: FinishReason::ToolCalls,
            ..Self::default()
        }
    }

    /// Converts the reply into the assistant message kept in the conversation.
    pub fn to_message(&self) -> Message {
        Message::assistant(self.content.clone(), self.tool_calls.clone())
    }
}

/// The reason the LLM finished generating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop point reached
    #[default]
    Stop,
    /// Stopped due to tool calls
    ToolCalls,
    /// Maximum tokens reached
    MaxTokens,
    /// Anything the API reported that is not recognized
    Other,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

/// Errors that can occur when communicating with an LLM.
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    /// An API error occurred
    #[error("API error: {0}")]
    ApiError(String),
    /// A network error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    /// The response from the LLM was invalid
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// Authentication failed or no credential was configured
    #[error("Authentication failed: {0}")]
    AuthError(String),
    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),
}

/// Trait for LLM clients.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Sends a request and returns the complete reply.
    async fn complete(&self, input: LLMInput) -> Result<LLMOutput, LLMError>;
}

/// A builder for creating LLM clients.
#[derive(Debug, Default)]
pub struct LLMClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl LLMClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Creates a client for an OpenAI-compatible chat completions API.
    ///
    /// Fails when no API key was given or it is blank.
    pub fn build_openai(self) -> Result<Arc<dyn LLMClient>, LLMError> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LLMError::AuthError("API key not provided".to_string()))?;
        let base_url = self.base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string());

        Ok(Arc::new(OpenAIClient::new(&api_key, base_url, self.timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_fails_fast() {
        let err = LLMClientBuilder::new().build_openai().err().unwrap();
        assert!(matches!(err, LLMError::AuthError(_)));
    }

    #[test]
    fn test_blank_api_key_fails_fast() {
        let err = LLMClientBuilder::new()
            .with_api_key("   ")
            .build_openai()
            .err()
            .unwrap();
        assert!(matches!(err, LLMError::AuthError(_)));
    }

    #[test]
    fn test_build_with_key() {
        let client = LLMClientBuilder::new()
            .with_api_key("gsk_test")
            .with_base_url("http://localhost:9999/v1")
            .with_timeout(Duration::from_secs(5))
            .build_openai();
        assert!(client.is_ok());
    }

    #[test]
    fn test_output_to_message_keeps_tool_calls() {
        let call = ToolCallRequest::new("call_1", "explore_csv", "{\"csv_name\":\"actuals.csv\"}");
        let message = LLMOutput::tool_calls(vec![call.clone()]).to_message();

        assert_eq!(message.tool_calls(), &[call]);
        assert_eq!(message.text(), None);
    }
}
