//! Binds a tool set to one turn's context and gates every invocation.
//!
//! Each call runs validate → authorize → execute in that order. The
//! permission decision is taken from the context role at bind time and is
//! never revisited while the bound set lives.

use crate::context::ToolContext;
use crate::definition::{PreparedCall, Tool};
use crate::envelope::{ErrorKind, ToolResult};
use crate::error::ToolError;
use crate::metrics::{record_dispatch, DispatchTimer};
use crate::registry::{ManifestEntry, ToolSet};
use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Execution limit for a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

const UNKNOWN_OUTCOME: &str = "UNKNOWN_TOOL";

/// Metric label for names outside the bound set; model input is never a label.
const UNKNOWN_TOOL_LABEL: &str = "<unknown>";

#[derive(Debug, Clone, Copy)]
pub struct Binder {
    timeout: Duration,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn bind(&self, context: &ToolContext, set: &ToolSet) -> BoundToolSet {
        let tools = set
            .iter()
            .map(|tool| {
                let allowed = context.role().satisfies(tool.minimum_role());
                let bound = BoundTool {
                    tool: Arc::clone(tool),
                    context: context.clone(),
                    allowed,
                    timeout: self.timeout,
                };
                (tool.name().to_string(), bound)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(
            persona = set.persona(),
            user_id = context.user_id(),
            role = %context.role(),
            tools = tools.len(),
            "Bound tool set"
        );

        BoundToolSet {
            persona: set.persona().to_string(),
            context: context.clone(),
            tools,
        }
    }
}

/// Bind with the default timeout.
pub fn bind(context: &ToolContext, set: &ToolSet) -> BoundToolSet {
    Binder::new().bind(context, set)
}

/// A tool closed over one turn's context.
#[derive(Clone)]
pub struct BoundTool {
    tool: Arc<dyn Tool>,
    context: ToolContext,
    allowed: bool,
    timeout: Duration,
}

impl BoundTool {
    pub fn name(&self) -> &str {
        self.tool.name()
    }

    /// Whether the bound role clears the tool's minimum role.
    pub fn is_permitted(&self) -> bool {
        self.allowed
    }

    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry::of(self.tool.as_ref())
    }

    pub async fn invoke(&self, raw: &Value) -> ToolResult<Value> {
        let name = self.tool.name();
        let _timer = DispatchTimer::new(name);
        info!(
            tool = name,
            user_id = self.context.user_id(),
            turn_id = %self.context.turn_id(),
            "Dispatching tool"
        );

        let result = self.gate(raw).await;
        record_dispatch(name, outcome_label(&result));
        result
    }

    async fn gate(&self, raw: &Value) -> ToolResult<Value> {
        let call = match self.tool.prepare(raw) {
            Ok(call) => call,
            Err(failure) => {
                debug!(tool = self.tool.name(), %failure, "Rejected arguments");
                return ToolResult::failure(ErrorKind::ValidationError, failure.to_string());
            }
        };

        if !self.allowed {
            warn!(
                tool = self.tool.name(),
                user_id = self.context.user_id(),
                role = %self.context.role(),
                required = ?self.tool.minimum_role(),
                "Permission denied"
            );
            return ToolResult::permission_denied();
        }

        self.execute_with_protection(call).await
    }

    async fn execute_with_protection(&self, call: PreparedCall) -> ToolResult<Value> {
        let name = self.tool.name();
        let mut handle = tokio::spawn(call(self.context.clone()));

        match timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(envelope))) => envelope,
            Ok(Ok(Err(e))) => self.map_tool_error(e),
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    error!(tool = name, turn_id = %self.context.turn_id(), "Tool execution panicked");
                } else {
                    error!(tool = name, turn_id = %self.context.turn_id(), "Tool execution cancelled");
                }
                ToolResult::internal()
            }
            Err(_) => {
                handle.abort();
                warn!(
                    tool = name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Tool execution timed out"
                );
                ToolResult::internal()
            }
        }
    }

    fn map_tool_error(&self, e: ToolError) -> ToolResult<Value> {
        let name = self.tool.name();
        match e {
            ToolError::NotFound(message) => ToolResult::failure(ErrorKind::NotFound, message),
            ToolError::InvalidArguments(message) => {
                ToolResult::failure(ErrorKind::ValidationError, message)
            }
            ToolError::PermissionDenied(reason) => {
                warn!(tool = name, user_id = self.context.user_id(), %reason, "Tool refused caller");
                ToolResult::permission_denied()
            }
            ToolError::Store(e) => {
                error!(tool = name, turn_id = %self.context.turn_id(), error = %e, "Store failure during tool execution");
                ToolResult::internal()
            }
            ToolError::Internal(detail) => {
                error!(tool = name, turn_id = %self.context.turn_id(), %detail, "Tool execution failed");
                ToolResult::internal()
            }
        }
    }
}

fn outcome_label(result: &ToolResult<Value>) -> &'static str {
    match result.error_kind() {
        None => "SUCCESS",
        Some(kind) => kind.as_str(),
    }
}

/// The turn's tools, each bound to the same context.
#[derive(Clone)]
pub struct BoundToolSet {
    persona: String,
    context: ToolContext,
    tools: BTreeMap<String, BoundTool>,
}

impl BoundToolSet {
    /// Invoke `name` with raw model arguments. Unknown names are rejected
    /// as a validation error.
    pub async fn dispatch(&self, name: &str, raw: &Value) -> ToolResult<Value> {
        match self.tools.get(name) {
            Some(tool) => tool.invoke(raw).await,
            None => {
                warn!(tool = name, user_id = self.context.user_id(), "Unknown tool requested");
                record_dispatch(UNKNOWN_TOOL_LABEL, UNKNOWN_OUTCOME);
                ToolResult::failure(ErrorKind::ValidationError, format!("unknown tool: {name}"))
            }
        }
    }

    /// Dispatch several calls concurrently; results keep request order.
    pub async fn dispatch_all(&self, calls: &[(String, Value)]) -> Vec<ToolResult<Value>> {
        join_all(calls.iter().map(|(name, raw)| self.dispatch(name, raw))).await
    }

    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.tools.values().map(BoundTool::manifest_entry).collect()
    }

    pub fn get(&self, name: &str) -> Option<&BoundTool> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }
}
