//! Conversation types exchanged between the loop and the completion model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema version for persisted conversation history.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// A single message in the conversation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub role: MessageRole,
    pub content: Value,
    /// Calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Request this tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Message {
    pub fn new(role: MessageRole, content: Value) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            metadata: None,
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(MessageRole::User, Value::String(text.to_string()))
    }

    pub fn assistant(text: &str) -> Self {
        Self::new(MessageRole::Assistant, Value::String(text.to_string()))
    }

    /// Assistant turn that requested tools.
    pub fn assistant_tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(MessageRole::Assistant, Value::Null)
        }
    }

    /// Tool message carrying a result envelope.
    pub fn tool_result(call: &ToolCallRequest, envelope: Value, retryable: bool) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            metadata: Some(serde_json::json!({
                "tool_name": call.tool_name,
                "retryable": retryable,
            })),
            ..Self::new(MessageRole::Tool, envelope)
        }
    }

    /// Content as plain text, if it is a string.
    pub fn text(&self) -> Option<&str> {
        self.content.as_str()
    }

    /// Validate schema version.
    pub fn validate_version(&self) -> Result<(), String> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                SCHEMA_VERSION, self.schema_version
            ));
        }
        Ok(())
    }
}

/// Normalized reply of the completion model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelReply {
    Final { content: String },
    ToolCalls { calls: Vec<ToolCallRequest> },
}
