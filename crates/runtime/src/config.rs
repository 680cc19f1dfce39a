//! Loop configuration loader.

use crate::interfaces::RuntimeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_STEPS: usize = 4;
pub const MAX_STEPS_LIMIT: usize = 16;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Stride, a training assistant for athletes and coaches. \
Use the available tools to look up data before answering. \
If a tool reports that a feature isn't available on the user's plan, tell the user so plainly and do not retry it.";

/// Whether the first model call must use a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolUse {
    #[default]
    Optional,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    /// Upper bound on tool-dispatch steps per turn.
    pub max_steps: usize,
    pub tool_use: ToolUse,
    pub system_prompt: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            tool_use: ToolUse::Optional,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl LoopConfig {
    /// # Errors
    /// Returns [`RuntimeError::Config`] for an out-of-range step bound or an
    /// empty system prompt.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if !(1..=MAX_STEPS_LIMIT).contains(&self.max_steps) {
            return Err(RuntimeError::Config(format!(
                "max_steps must be between 1 and {}, got {}",
                MAX_STEPS_LIMIT, self.max_steps
            )));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(RuntimeError::Config(
                "system_prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a loop configuration from a YAML file.
///
/// Absent keys take their defaults.
pub fn load_loop_config(path: impl AsRef<Path>) -> Result<LoopConfig, RuntimeError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RuntimeError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;

    if content.trim().is_empty() {
        return Err(RuntimeError::Config("Config file is empty".to_string()));
    }

    let config: LoopConfig = serde_yaml::from_str(&content)
        .map_err(|e| RuntimeError::Config(format!("Invalid YAML: {}", e)))?;
    config.validate()?;
    Ok(config)
}
