//! Agent loop - bounded model/tool exchange for one turn.

use crate::config::{LoopConfig, ToolUse};
use crate::interfaces::{
    CompletionModel, CompletionRequest, RuntimeError, ToolChoice, ToolDispatcher,
};
use crate::metrics::{record_turn_steps, MetricTimer};
use crate::types::{Message, ModelReply, ToolCallRequest};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use stride_tools::{ErrorKind, ManifestEntry, ToolResult, PLAN_RESTRICTED_MESSAGE};
use tracing::{debug, error, info, warn};

/// Appended to the system prompt of the closing model call.
pub const STEP_LIMIT_NOTE: &str = "The tool budget for this turn is used up. \
Answer the user now with the information you already have and do not request more tools.";

/// Answer used when the closing call still does not produce text.
pub const FALLBACK_ANSWER: &str =
    "I couldn't finish that request in one go. Could you narrow it down and ask again?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Ready,
    ModelThinking,
    ToolDispatch,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered on its own.
    FinalAnswer,
    /// The step bound forced the closing call.
    StepLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    pub step: usize,
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
    pub result: ToolResult<Value>,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    pub stop_reason: StopReason,
    /// Dispatch steps used.
    pub steps: usize,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Fixed plan message when any call in the turn was denied.
    pub plan_notice: Option<String>,
    /// Full history including this turn.
    pub messages: Vec<Message>,
}

/// Mutable state of one running turn.
struct Turn {
    state: TurnState,
    messages: Vec<Message>,
    records: Vec<ToolCallRecord>,
    steps: usize,
    terminal_tools: BTreeSet<String>,
    denied: bool,
}

impl Turn {
    fn new(messages: Vec<Message>) -> Self {
        Self {
            state: TurnState::Ready,
            messages,
            records: Vec::new(),
            steps: 0,
            terminal_tools: BTreeSet::new(),
            denied: false,
        }
    }

    fn enter(&mut self, next: TurnState) {
        debug!(from = ?self.state, to = ?next, step = self.steps, "Turn transition");
        self.state = next;
    }

    fn finish(mut self, answer: String, stop_reason: StopReason) -> TurnOutcome {
        self.enter(TurnState::Done);
        self.messages.push(Message::assistant(&answer));
        record_turn_steps(self.steps);

        TurnOutcome {
            answer,
            stop_reason,
            steps: self.steps,
            tool_calls: self.records,
            plan_notice: self.denied.then(|| PLAN_RESTRICTED_MESSAGE.to_string()),
            messages: self.messages,
        }
    }
}

/// Core agent execution loop.
pub struct AgentLoop<M: CompletionModel> {
    model: Arc<M>,
    config: LoopConfig,
}

impl<M: CompletionModel> AgentLoop<M> {
    pub fn new(model: Arc<M>, config: LoopConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Run one turn: `user_message` is appended to `history` and the model is
    /// called until it answers or the step bound is reached.
    ///
    /// The model is called at most `max_steps + 1` times.
    ///
    /// # Errors
    /// Completion API failures propagate as [`RuntimeError::Model`].
    pub async fn run<D>(
        &self,
        dispatcher: &D,
        history: Vec<Message>,
        user_message: &str,
    ) -> Result<TurnOutcome, RuntimeError>
    where
        D: ToolDispatcher + ?Sized,
    {
        let manifest = dispatcher.manifest();
        let mut messages = history;
        messages.push(Message::user(user_message));
        let mut turn = Turn::new(messages);

        info!(tools = manifest.len(), max_steps = self.config.max_steps, "Starting turn");

        while turn.steps < self.config.max_steps {
            let tool_choice = match (self.config.tool_use, turn.steps) {
                (ToolUse::Required, 0) => ToolChoice::Required,
                _ => ToolChoice::Auto,
            };

            turn.enter(TurnState::ModelThinking);
            let prompt = self.system_prompt(&turn.terminal_tools);
            let reply = self.call_model(prompt, &turn, &manifest, tool_choice).await?;

            match reply {
                ModelReply::Final { content } => {
                    info!(steps = turn.steps, "Model returned final answer");
                    return Ok(turn.finish(content, StopReason::FinalAnswer));
                }
                ModelReply::ToolCalls { calls } if calls.is_empty() => {
                    warn!(step = turn.steps, "Model returned an empty tool call list");
                    return self.close(turn, &manifest, StopReason::FinalAnswer).await;
                }
                ModelReply::ToolCalls { calls } => {
                    self.dispatch_step(dispatcher, &mut turn, calls).await?;
                }
            }
        }

        info!(steps = turn.steps, "Step limit reached");
        self.close(turn, &manifest, StopReason::StepLimit).await
    }

    async fn dispatch_step<D>(
        &self,
        dispatcher: &D,
        turn: &mut Turn,
        calls: Vec<ToolCallRequest>,
    ) -> Result<(), RuntimeError>
    where
        D: ToolDispatcher + ?Sized,
    {
        turn.enter(TurnState::ToolDispatch);
        turn.steps += 1;
        let step = turn.steps;

        for call in &calls {
            if turn.terminal_tools.contains(&call.tool_name) {
                warn!(tool = %call.tool_name, step, "Model retried a tool marked terminal this turn");
            }
        }

        turn.messages.push(Message::assistant_tool_calls(calls.clone()));

        let results = join_all(
            calls
                .iter()
                .map(|call| dispatcher.dispatch(&call.tool_name, &call.arguments)),
        )
        .await;

        for (call, result) in calls.into_iter().zip(results) {
            let kind = result.error_kind();
            let retryable = kind.map_or(true, ErrorKind::is_recoverable);
            if kind == Some(ErrorKind::PermissionDenied) {
                turn.denied = true;
            }
            if !retryable {
                turn.terminal_tools.insert(call.tool_name.clone());
            }

            let envelope = serde_json::to_value(&result)?;
            turn.messages
                .push(Message::tool_result(&call, envelope, retryable));
            turn.records.push(ToolCallRecord {
                step,
                call_id: call.id,
                tool_name: call.tool_name,
                arguments: call.arguments,
                result,
            });
        }

        debug!(step, calls = turn.records.len(), "Dispatch step complete");
        Ok(())
    }

    /// Closing call with tools disabled.
    async fn close(
        &self,
        mut turn: Turn,
        manifest: &[ManifestEntry],
        stop_reason: StopReason,
    ) -> Result<TurnOutcome, RuntimeError> {
        turn.enter(TurnState::ModelThinking);
        let mut prompt = self.system_prompt(&turn.terminal_tools);
        if stop_reason == StopReason::StepLimit {
            prompt = format!("{prompt}\n\n{STEP_LIMIT_NOTE}");
        }

        let answer = match self
            .call_model(prompt, &turn, manifest, ToolChoice::None)
            .await?
        {
            ModelReply::Final { content } => content,
            ModelReply::ToolCalls { calls } => {
                warn!(requested = calls.len(), "Model requested tools after the step limit");
                FALLBACK_ANSWER.to_string()
            }
        };

        Ok(turn.finish(answer, stop_reason))
    }

    async fn call_model(
        &self,
        system_prompt: String,
        turn: &Turn,
        manifest: &[ManifestEntry],
        tool_choice: ToolChoice,
    ) -> Result<ModelReply, RuntimeError> {
        let _timer = MetricTimer::new();
        let request = CompletionRequest {
            system_prompt,
            messages: turn.messages.clone(),
            tools: manifest.to_vec(),
            tool_choice,
        };

        self.model.complete(request).await.map_err(|e| {
            error!("Model call failed: {}", e);
            e
        })
    }

    fn system_prompt(&self, terminal_tools: &BTreeSet<String>) -> String {
        if terminal_tools.is_empty() {
            return self.config.system_prompt.clone();
        }
        let names: Vec<&str> = terminal_tools.iter().map(String::as_str).collect();
        format!(
            "{}\n\nThese tools failed permanently this turn, do not call them again: {}.",
            self.config.system_prompt,
            names.join(", ")
        )
    }
}
