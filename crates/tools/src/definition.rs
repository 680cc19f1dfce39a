use crate::context::ToolContext;
use crate::envelope::ToolResult;
use crate::error::{SchemaError, ToolError};
use crate::role::Role;
use crate::schema::{ParameterSchema, ValidationFailure};
use async_trait::async_trait;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Value a tool hands back from `execute`.
///
/// Plain data is wrapped as a success. A [`ToolResult`] is taken as the
/// tool's own envelope and passed through unchanged.
pub trait ToolOutput: Serialize + Sized + Send + 'static {
    fn into_envelope(self) -> Result<ToolResult<Value>, serde_json::Error> {
        serde_json::to_value(self).map(ToolResult::success)
    }
}

impl ToolOutput for Value {}
impl ToolOutput for () {}
impl<T: Serialize + Send + 'static> ToolOutput for Vec<T> {}

impl<T: Serialize + Send + 'static> ToolOutput for ToolResult<T> {
    fn into_envelope(self) -> Result<ToolResult<Value>, serde_json::Error> {
        match self {
            ToolResult::Success(data) => serde_json::to_value(data).map(ToolResult::success),
            ToolResult::Failure(body) => Ok(ToolResult::Failure(body)),
        }
    }
}

/// A callable operation as declared by its author.
///
/// Definitions are stateless and built once at startup. Domain failures
/// (e.g. an unknown entity) are returned as [`ToolError`] variants rather
/// than panics.
#[async_trait]
pub trait ToolDefinition: Send + Sync + 'static {
    type Params: DeserializeOwned + JsonSchema + Send + 'static;
    type Output: ToolOutput;

    fn name(&self) -> &'static str;

    /// Guidance for the model. Never consulted for authorization.
    fn description(&self) -> &'static str;

    /// `None` admits any authenticated caller.
    fn minimum_role(&self) -> Option<Role> {
        None
    }

    async fn execute(
        &self,
        params: Self::Params,
        ctx: &ToolContext,
    ) -> Result<Self::Output, ToolError>;
}

/// Arguments that passed validation, ready to run against a context.
pub type PreparedCall =
    Box<dyn FnOnce(ToolContext) -> BoxFuture<'static, Result<ToolResult<Value>, ToolError>> + Send>;

/// Type-erased tool as held by a [`crate::registry::ToolSet`].
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn minimum_role(&self) -> Option<Role>;
    fn schema(&self) -> &ParameterSchema;

    /// Validate raw arguments and capture the typed parameters.
    fn prepare(&self, raw: &Value) -> Result<PreparedCall, ValidationFailure>;
}

/// Adapts a [`ToolDefinition`] to [`Tool`] with its compiled schema.
pub struct TypedTool<D: ToolDefinition> {
    definition: Arc<D>,
    schema: ParameterSchema,
}

impl<D: ToolDefinition> TypedTool<D> {
    /// # Errors
    /// Returns [`SchemaError`] if `D::Params` has no usable schema.
    pub fn new(definition: D) -> Result<Self, SchemaError> {
        Ok(Self {
            definition: Arc::new(definition),
            schema: ParameterSchema::for_params::<D::Params>()?,
        })
    }
}

impl<D: ToolDefinition> Tool for TypedTool<D> {
    fn name(&self) -> &str {
        self.definition.name()
    }

    fn description(&self) -> &str {
        self.definition.description()
    }

    fn minimum_role(&self) -> Option<Role> {
        self.definition.minimum_role()
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    fn prepare(&self, raw: &Value) -> Result<PreparedCall, ValidationFailure> {
        let params: D::Params = self.schema.parse(raw)?;
        let definition = Arc::clone(&self.definition);

        Ok(Box::new(move |ctx: ToolContext| {
            Box::pin(async move {
                let output = definition.execute(params, &ctx).await?;
                output
                    .into_envelope()
                    .map_err(|e| ToolError::Internal(format!("failed to encode output: {e}")))
            }) as BoxFuture<'static, Result<ToolResult<Value>, ToolError>>
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::context::privileged::create_context_with_role;
    use crate::memory_store::MemoryStore;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct EchoParams {
        message: String,
    }

    struct EchoTool;

    #[async_trait]
    impl ToolDefinition for EchoTool {
        type Params = EchoParams;
        type Output = Value;

        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echoes the message and caller back"
        }

        async fn execute(&self, params: EchoParams, ctx: &ToolContext) -> Result<Value, ToolError> {
            Ok(json!({"message": params.message, "user": ctx.user_id()}))
        }
    }

    #[tokio::test]
    async fn test_prepare_then_run() {
        let tool = TypedTool::new(EchoTool).unwrap();
        let ctx = create_context_with_role(Arc::new(MemoryStore::new()), "u1", Role::Free);

        let call = tool.prepare(&json!({"message": "hi"})).unwrap();
        let output = call(ctx).await.unwrap();
        assert_eq!(output.data(), Some(&json!({"message": "hi", "user": "u1"})));
    }

    #[test]
    fn test_envelope_output_passes_through() {
        use crate::envelope::ErrorKind;

        let failed: ToolResult<Vec<u32>> = ToolResult::failure(ErrorKind::NotFound, "gone");
        let envelope = failed.into_envelope().unwrap();
        assert_eq!(envelope.error_kind(), Some(ErrorKind::NotFound));

        let ok = ToolResult::success(vec![1u32, 2]).into_envelope().unwrap();
        assert_eq!(ok.data(), Some(&json!([1, 2])));

        let plain = json!({"success": false}).into_envelope().unwrap();
        assert_eq!(plain.data(), Some(&json!({"success": false})));
    }

    #[test]
    fn test_prepare_rejects_invalid_arguments() {
        let tool = TypedTool::new(EchoTool).unwrap();
        let failure = tool.prepare(&json!({"message": 42})).err().unwrap();
        assert_eq!(failure.issues[0].field, "message");
    }

    #[test]
    fn test_metadata_passthrough() {
        let tool = TypedTool::new(EchoTool).unwrap();
        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.minimum_role(), None);
        assert_eq!(tool.schema().document()["required"], json!(["message"]));
    }
}
