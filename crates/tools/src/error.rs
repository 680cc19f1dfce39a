use thiserror::Error;

/// Errors a tool's `execute` may return.
///
/// The binder maps each variant onto the envelope taxonomy; see
/// [`crate::envelope::ErrorKind`].
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence layer failures.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("user_id must be non-empty")]
    EmptyUserId,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid schema for tool '{tool}': {source}")]
    Schema {
        tool: String,
        #[source]
        source: SchemaError,
    },
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to encode schema: {0}")]
    Encode(String),

    #[error("failed to compile schema: {0}")]
    Compile(String),
}
