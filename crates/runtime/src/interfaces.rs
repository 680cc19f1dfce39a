//! Seams between the loop, the completion model and the tool layer.

use crate::types::{Message, ModelReply};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stride_tools::{BoundToolSet, ManifestEntry, ToolResult};
use thiserror::Error;

/// Runtime errors.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How the model may use tools on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    Required,
    None,
}

impl ToolChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
            ToolChoice::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ManifestEntry>,
    pub tool_choice: ToolChoice,
}

/// Chat completion backend.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<ModelReply, RuntimeError>;
}

/// Executes model tool calls for one turn.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    fn manifest(&self) -> Vec<ManifestEntry>;

    async fn dispatch(&self, name: &str, arguments: &Value) -> ToolResult<Value>;
}

#[async_trait]
impl ToolDispatcher for BoundToolSet {
    fn manifest(&self) -> Vec<ManifestEntry> {
        BoundToolSet::manifest(self)
    }

    async fn dispatch(&self, name: &str, arguments: &Value) -> ToolResult<Value> {
        BoundToolSet::dispatch(self, name, arguments).await
    }
}
