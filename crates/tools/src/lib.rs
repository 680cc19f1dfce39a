//! Stride tool layer
//!
//! Role-gated, schema-validated tools for the coaching assistant. A turn
//! resolves a [`ToolContext`] once, binds a [`ToolSet`] to it and dispatches
//! model tool calls through the resulting [`BoundToolSet`].

pub mod error;
pub mod role;
pub mod store;
pub mod memory_store;
pub mod context;
pub mod schema;
pub mod envelope;
pub mod definition;
pub mod registry;
pub mod binder;
pub mod metrics;
pub mod catalog;

pub use error::{ContextError, RegistryError, SchemaError, StoreError, ToolError};
pub use role::Role;
pub use store::Store;
pub use memory_store::{Fixtures, MemoryStore};
pub use context::{create_context, ToolContext};
pub use schema::{FieldIssue, ParameterSchema, ValidationFailure};
pub use envelope::{ErrorBody, ErrorKind, ToolResult, INTERNAL_ERROR_MESSAGE, PLAN_RESTRICTED_MESSAGE};
pub use definition::{Tool, ToolDefinition, ToolOutput, TypedTool};
pub use registry::{ManifestEntry, ToolSet};
pub use binder::{bind, Binder, BoundTool, BoundToolSet, DEFAULT_TOOL_TIMEOUT};
pub use catalog::{athlete_tools, coach_tools};
