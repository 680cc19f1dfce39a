//! Uniform result envelope returned by every bound tool invocation.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown for every permission denial, whatever the tool.
pub const PLAN_RESTRICTED_MESSAGE: &str = "This feature isn't available on your current plan.";

/// Surfaced for unexpected failures; details stay in server logs.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "The operation could not be completed due to an internal error.";

/// Closed error vocabulary of the dispatch layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing arguments. The model should retry with corrected
    /// arguments.
    ValidationError,
    /// Role too low. Not recoverable within the turn.
    PermissionDenied,
    /// Referenced entity does not exist. The model may ask for clarification.
    NotFound,
    /// Unexpected failure. Never retried automatically.
    InternalError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }

    /// The model can adapt within the turn (fix arguments, ask a question).
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::ValidationError | ErrorKind::NotFound)
    }

    /// The tool should not be tried again for this line of reasoning.
    pub fn is_terminal(self) -> bool {
        !self.is_recoverable()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
}

/// `{ "success": true, "data": T }` or
/// `{ "success": false, "error": { "code", "message" } }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult<T> {
    Success(T),
    Failure(ErrorBody),
}

impl<T> ToolResult<T> {
    pub fn success(data: T) -> Self {
        ToolResult::Success(data)
    }

    pub fn failure(code: ErrorKind, message: impl Into<String>) -> Self {
        ToolResult::Failure(ErrorBody {
            code,
            message: message.into(),
        })
    }

    pub fn permission_denied() -> Self {
        Self::failure(ErrorKind::PermissionDenied, PLAN_RESTRICTED_MESSAGE)
    }

    pub fn internal() -> Self {
        Self::failure(ErrorKind::InternalError, INTERNAL_ERROR_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ToolResult::Success(data) => Some(data),
            ToolResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorBody> {
        match self {
            ToolResult::Success(_) => None,
            ToolResult::Failure(body) => Some(body),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.code)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ToolResult<U> {
        match self {
            ToolResult::Success(data) => ToolResult::Success(f(data)),
            ToolResult::Failure(body) => ToolResult::Failure(body),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorBody> {
        match self {
            ToolResult::Success(data) => Ok(data),
            ToolResult::Failure(body) => Err(body),
        }
    }
}

impl<T: Serialize> Serialize for ToolResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolResult", 2)?;
        match self {
            ToolResult::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            ToolResult::Failure(body) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", body)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorBody>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ToolResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::<T>::deserialize(deserializer)?;
        match (raw.success, raw.data, raw.error) {
            (true, Some(data), None) => Ok(ToolResult::Success(data)),
            (false, None, Some(error)) => Ok(ToolResult::Failure(error)),
            (true, _, _) => Err(de::Error::custom(
                "successful envelope must carry data and no error",
            )),
            (false, _, _) => Err(de::Error::custom(
                "failed envelope must carry an error and no data",
            )),
        }
    }
}
