use crate::definition::{Tool, ToolDefinition, TypedTool};
use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What the model sees of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

impl ManifestEntry {
    pub(crate) fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            schema: tool.schema().document().clone(),
        }
    }

    /// OpenAI function-calling form.
    pub fn to_function_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.schema
            }
        })
    }
}

/// Tools curated for one agent persona, keyed by unique name.
pub struct ToolSet {
    persona: String,
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            tools: BTreeMap::new(),
        }
    }

    /// Register a definition, compiling its parameter schema.
    ///
    /// # Errors
    /// Fails on a duplicate name or an unusable schema.
    pub fn register<D: ToolDefinition>(&mut self, definition: D) -> Result<&mut Self, RegistryError> {
        let name = definition.name();
        let tool = TypedTool::new(definition).map_err(|source| RegistryError::Schema {
            tool: name.to_string(),
            source,
        })?;
        self.register_dyn(Arc::new(tool))
    }

    /// Register an already type-erased tool.
    ///
    /// # Errors
    /// Fails if a tool with the same name is already registered.
    pub fn register_dyn(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self, RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(self)
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names in manifest order.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.tools.values().map(|t| ManifestEntry::of(t.as_ref())).collect()
    }
}
