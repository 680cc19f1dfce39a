//! Stride Runtime
//!
//! Bounded orchestration loop that drives a completion model over a turn's
//! bound tool set.

pub mod types;
pub mod interfaces;
pub mod config;
pub mod agent_loop;
pub mod openai;
pub mod metrics;

pub use types::{Message, MessageRole, ModelReply, ToolCallRequest, SCHEMA_VERSION};
pub use interfaces::{CompletionModel, CompletionRequest, RuntimeError, ToolChoice, ToolDispatcher};
pub use config::{load_loop_config, LoopConfig, ToolUse};
pub use agent_loop::{AgentLoop, StopReason, ToolCallRecord, TurnOutcome, TurnState};
pub use openai::OpenAiClient;
