use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stride_runtime::LoopConfig;
use stride_tools::{Fixtures, MemoryStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub max_retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub agent: LoopConfig,
    pub tool_timeout_ms: u64,
    /// YAML store fixture; the built-in demo data is used when absent.
    pub fixtures: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            agent: LoopConfig::default(),
            tool_timeout_ms: 30_000,
            fixtures: None,
        }
    }
}

impl AppConfig {
    /// Load from YAML. A relative `fixtures` path is resolved against the
    /// config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Some(fixtures) = config.fixtures.take() {
            let resolved = if fixtures.is_absolute() {
                fixtures
            } else {
                path.parent().unwrap_or_else(|| Path::new(".")).join(fixtures)
            };
            config.fixtures = Some(resolved);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        if self.tool_timeout_ms == 0 {
            bail!("tool_timeout_ms must be greater than zero");
        }
        if self.model.model.trim().is_empty() {
            bail!("model.model must not be empty");
        }
        if self.model.base_url.trim().is_empty() {
            bail!("model.base_url must not be empty");
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.model.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Store backing the tools: fixture file if configured, demo data otherwise.
    pub fn load_store(&self) -> Result<MemoryStore> {
        let Some(path) = &self.fixtures else {
            return Ok(MemoryStore::demo());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures {}", path.display()))?;
        let fixtures: Fixtures = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures {}", path.display()))?;
        Ok(MemoryStore::from_fixtures(fixtures))
    }
}
