use crate::cli::Caller;
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde_json::Value;
use std::sync::Arc;
use stride_tools::{
    catalog, create_context, Binder, ManifestEntry, Store, ToolContext, ToolResult, ToolSet,
};
#[cfg(feature = "privileged")]
use stride_tools::{context::privileged::create_context_with_role, Role};
#[cfg(feature = "privileged")]
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Persona {
    Athlete,
    Coach,
}

impl Persona {
    pub fn tool_set(self) -> Result<ToolSet> {
        let set = match self {
            Persona::Athlete => catalog::athlete_tools(),
            Persona::Coach => catalog::coach_tools(),
        };
        set.context("Failed to build tool set")
    }
}

/// Role override for local testing.
#[cfg(feature = "privileged")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Free,
    Premium,
    Coach,
}

#[cfg(feature = "privileged")]
impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Free => Role::Free,
            RoleArg::Premium => Role::Premium,
            RoleArg::Coach => Role::Coach,
        }
    }
}

/// Build the turn context. The role comes from the store; only `privileged`
/// builds honor an `--as-role` override.
pub async fn open_context(store: Arc<dyn Store>, caller: &Caller) -> Result<ToolContext> {
    #[cfg(feature = "privileged")]
    if let Some(role) = caller.as_role {
        warn!(user_id = %caller.user, "Role resolution bypassed by --as-role");
        return Ok(create_context_with_role(store, &caller.user, role.into()));
    }

    Ok(create_context(store, &caller.user).await?)
}

/// One gated dispatch with raw JSON arguments.
pub async fn dispatch_once(
    ctx: &ToolContext,
    persona: Persona,
    binder: Binder,
    tool: &str,
    raw_args: &str,
) -> Result<ToolResult<Value>> {
    let arguments: Value = serde_json::from_str(raw_args)
        .map_err(|e| anyhow!("--args is not valid JSON: {}", e))?;
    let bound = binder.bind(ctx, &persona.tool_set()?);
    Ok(bound.dispatch(tool, &arguments).await)
}

pub fn manifest(persona: Persona) -> Result<Vec<ManifestEntry>> {
    Ok(persona.tool_set()?.manifest())
}
