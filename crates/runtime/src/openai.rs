//! Completion client for OpenAI-compatible chat APIs.

use crate::interfaces::{CompletionModel, CompletionRequest, RuntimeError};
use crate::types::{Message, MessageRole, ModelReply, ToolCallRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Failure of one HTTP attempt.
#[derive(Debug)]
enum AttemptError {
    Retryable(String),
    Fatal(String),
}

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            max_retries: 2,
            client,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn call_once(&self, body: &ChatRequest) -> Result<ModelReply, AttemptError> {
        let mut req = self.client.post(self.endpoint()).json(body);
        if let Some(api_key) = &self.api_key {
            req = req.bearer_auth(api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let message = format!("HTTP {}: {}", status, detail);
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                AttemptError::Retryable(message)
            } else {
                AttemptError::Fatal(message)
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AttemptError::Retryable(format!("Failed to read response: {}", e)))?;
        parse_reply(&text).map_err(|e| AttemptError::Fatal(e.to_string()))
    }
}

#[async_trait]
impl CompletionModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ModelReply, RuntimeError> {
        let body = encode_request(&self.model, &request);
        debug!(
            model = %self.model,
            tools = body.tools.len(),
            tool_choice = ?body.tool_choice,
            "Calling completion API"
        );

        let mut last_error = String::from("Unknown error");
        for attempt in 0..=self.max_retries {
            match self.call_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(AttemptError::Fatal(message)) => return Err(RuntimeError::Model(message)),
                Err(AttemptError::Retryable(message)) => {
                    warn!("Completion call failed (attempt {}): {}", attempt + 1, message);
                    last_error = message;
                    if attempt < self.max_retries {
                        tokio::time::sleep(retry_delay(attempt)).await;
                    }
                }
            }
        }

        Err(RuntimeError::Model(format!(
            "Completion call failed after {} attempts: {}",
            self.max_retries + 1,
            last_error
        )))
    }
}

fn retry_delay(attempt: u32) -> Duration {
    let millis = 250_u64.saturating_mul(2_u64.saturating_pow(attempt));
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

fn encode_request(model: &str, request: &CompletionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !request.system_prompt.is_empty() {
        messages.push(json!({"role": "system", "content": request.system_prompt}));
    }
    messages.extend(request.messages.iter().map(encode_message));

    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|entry| entry.to_function_schema())
        .collect();
    let tool_choice = (!tools.is_empty()).then(|| request.tool_choice.as_str());

    ChatRequest {
        model: model.to_string(),
        messages,
        tools,
        tool_choice,
        temperature: 0.2,
    }
}

fn encode_message(msg: &Message) -> Value {
    match msg.role {
        MessageRole::Assistant if !msg.tool_calls.is_empty() => {
            let calls: Vec<Value> = msg
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.tool_name,
                            "arguments": call.arguments.to_string()
                        }
                    })
                })
                .collect();
            json!({"role": "assistant", "content": Value::Null, "tool_calls": calls})
        }
        MessageRole::Tool => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.as_deref().unwrap_or_default(),
            "content": content_text(&msg.content)
        }),
        role => json!({"role": role, "content": content_text(&msg.content)}),
    }
}

fn content_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a chat completion response body.
///
/// Argument strings that are not valid JSON are kept as JSON strings so the
/// tool gate reports them as a validation error.
pub fn parse_reply(body: &str) -> Result<ModelReply, RuntimeError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RuntimeError::Model(format!("Failed to parse response: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RuntimeError::Model("No choices in response".to_string()))?;

    match choice.message.tool_calls {
        Some(calls) if !calls.is_empty() => {
            let calls = calls
                .into_iter()
                .enumerate()
                .map(|(i, call)| {
                    ToolCallRequest::new(
                        call.id.unwrap_or_else(|| format!("call_{}", i)),
                        call.function.name,
                        parse_arguments(call.function.arguments),
                    )
                })
                .collect();
            Ok(ModelReply::ToolCalls { calls })
        }
        _ => Ok(ModelReply::Final {
            content: choice.message.content.unwrap_or_default(),
        }),
    }
}

fn parse_arguments(raw: String) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}
