use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::{FinishReason, LLMClient, LLMError, LLMInput, LLMOutput, ToolChoice, Usage};
use crate::conversation::{Message, ToolCallRequest};
use crate::tool::ToolSchema;

/// Base URL of Groq's OpenAI-compatible endpoint.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// OpenAI API response for chat completions.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    #[serde(default)]
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Default, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    max_tokens: u32,
    temperature: f32,
}

/// An LLM client for OpenAI-compatible chat completion APIs (OpenAI, Groq).
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
}

impl OpenAIClient {
    /// Creates a new client.
    pub fn new(
        api_key: &str,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LLMError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| LLMError::AuthError("API key contains invalid characters".to_string()))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let mut client_builder = reqwest::Client::builder().default_headers(headers);

        if let Some(timeout) = timeout {
            client_builder = client_builder.timeout(timeout);
        }

        Ok(Self {
            client: client_builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds the JSON body of a chat completions request.
    fn request_body(input: &LLMInput) -> Value {
        let has_tools = !input.tools.is_empty();
        let body = ChatRequest {
            model: &input.model,
            messages: input.messages.iter().map(Self::wire_message).collect(),
            tools: has_tools.then_some(input.tools.as_slice()),
            tool_choice: has_tools.then_some(input.tool_choice),
            max_tokens: input.max_tokens,
            temperature: input.temperature,
        };

        // Only plain structs and strings go in, so this cannot fail.
        serde_json::to_value(&body).unwrap_or(Value::Null)
    }

    /// Converts a conversation message into the API's message shape.
    fn wire_message(message: &Message) -> Value {
        match message {
            Message::System { content } => json!({
                "role": "system",
                "content": content
            }),
            Message::User { content } => json!({
                "role": "user",
                "content": content
            }),
            Message::Assistant {
                content,
                tool_calls,
            } if !tool_calls.is_empty() => {
                let tool_calls: Vec<Value> = tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments
                            }
                        })
                    })
                    .collect();
                json!({
                    "role": "assistant",
                    "content": content,
                    "tool_calls": tool_calls
                })
            }
            Message::Assistant { content, .. } => json!({
                "role": "assistant",
                "content": content.as_deref().unwrap_or_default()
            }),
            Message::Tool {
                tool_call_id,
                name,
                content,
            } => json!({
                "role": "tool",
                "tool_call_id": tool_call_id,
                "name": name,
                "content": content
            }),
        }
    }

    /// Parses a chat completions response body into the first choice.
    fn parse_completion(response_text: &str) -> Result<LLMOutput, LLMError> {
        let response: ChatCompletionResponse = serde_json::from_str(response_text)
            .map_err(|e| LLMError::InvalidResponse(format!("{}: {}", e, response_text)))?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Err(LLMError::InvalidResponse(format!(
                "No choices in response. Response: {}",
                response_text
            )));
        };

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest::new(call.id, call.function.name, call.function.arguments))
            .collect();

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") | None => FinishReason::Stop,
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("length") => FinishReason::MaxTokens,
            Some(_) => FinishReason::Other,
        };

        Ok(LLMOutput {
            content: choice.message.content.filter(|text| !text.is_empty()),
            tool_calls,
            finish_reason,
            usage: Usage {
                input_tokens: response.usage.prompt_tokens,
                output_tokens: response.usage.completion_tokens,
            },
        })
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, input: LLMInput) -> Result<LLMOutput, LLMError> {
        debug!(
            model = %input.model,
            messages = input.messages.len(),
            tools = input.tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&Self::request_body(&input))
            .send()
            .await?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    LLMError::AuthError(response_text)
                }
                StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimitError(response_text),
                _ => LLMError::ApiError(format!("{}: {}", status, response_text)),
            });
        }

        debug!(response = %response_text, "LLM response");

        Self::parse_completion(&response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ParamSpec, ToolDescriptor, build_tool_schema};

    fn input_with_history() -> LLMInput {
        let schema = build_tool_schema(&ToolDescriptor {
            name: "explore_csv".to_string(),
            description: "Explore a CSV file".to_string(),
            parameters: vec![ParamSpec::text("csv_name", "Name of the CSV file")],
        })
        .unwrap();

        LLMInput {
            model: "openai/gpt-oss-20b".to_string(),
            messages: vec![
                Message::system("You are an analyst."),
                Message::user("What was revenue?"),
                Message::assistant(
                    None,
                    vec![ToolCallRequest::new(
                        "call_1",
                        "explore_csv",
                        "{\"csv_name\":\"actuals.csv\"}",
                    )],
                ),
                Message::tool_result("call_1", "explore_csv", "{\"success\":true}"),
            ],
            tools: vec![schema],
            tool_choice: ToolChoice::Auto,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_request_body_carries_tools_and_sampling() {
        let body = OpenAIClient::request_body(&input_with_history());

        assert_eq!(body["model"], "openai/gpt-oss-20b");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["max_tokens"], 4096);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "explore_csv");
    }

    #[test]
    fn test_request_body_messages_keep_order_and_shape() {
        let body = OpenAIClient::request_body(&input_with_history());
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert!(messages[2]["content"].is_null());
        assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            messages[2]["tool_calls"][0]["function"]["arguments"],
            "{\"csv_name\":\"actuals.csv\"}"
        );
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert_eq!(messages[3]["name"], "explore_csv");
    }

    #[test]
    fn test_request_without_tools_omits_tool_choice() {
        let mut input = input_with_history();
        input.tools.clear();
        let body = OpenAIClient::request_body(&input);

        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function",
                         "function": {"name": "explore_csv", "arguments": "{\"csv_name\":\"budget.csv\"}"}},
                        {"id": "call_b", "type": "function",
                         "function": {"name": "explore_csv", "arguments": "not json"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        }"#;

        let output = OpenAIClient::parse_completion(body).unwrap();

        assert_eq!(output.finish_reason, FinishReason::ToolCalls);
        assert_eq!(output.content, None);
        assert_eq!(output.tool_calls.len(), 2);
        assert_eq!(output.tool_calls[0].id, "call_a");
        assert_eq!(output.tool_calls[0].arguments, "{\"csv_name\":\"budget.csv\"}");
        assert_eq!(output.tool_calls[1].arguments, "not json");
        assert_eq!(output.usage.input_tokens, 120);
        assert_eq!(output.usage.output_tokens, 30);
    }

    #[test]
    fn test_parse_text_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Revenue was $500,000."},"finish_reason":"stop"}]}"#;

        let output = OpenAIClient::parse_completion(body).unwrap();

        assert_eq!(output.content.as_deref(), Some("Revenue was $500,000."));
        assert!(output.tool_calls.is_empty());
        assert_eq!(output.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_parse_rejects_empty_choices() {
        let err = OpenAIClient::parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LLMError::InvalidResponse(msg) if msg.contains("No choices")));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = OpenAIClient::parse_completion("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, LLMError::InvalidResponse(_)));
    }
}
