//! Parameter schemas derived from tool argument types.
//!
//! A schema is generated once from the `Params` type and compiled into a
//! validator. The same document is published in the model manifest, so what
//! the model is told and what the gate enforces cannot drift apart.

use crate::error::SchemaError;
use jsonschema::JSONSchema;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

const ROOT_FIELD: &str = "$";

/// One failed field and the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

/// Structured rejection of raw tool arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub issues: Vec<FieldIssue>,
}

impl ValidationFailure {
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|i| i.field.as_str())
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid arguments: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.field, issue.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Compiled argument schema of one tool.
pub struct ParameterSchema {
    document: Value,
    validator: JSONSchema,
}

impl ParameterSchema {
    /// Derive and compile the schema of `P`.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if the derived document cannot be encoded or
    /// compiled.
    pub fn for_params<P: JsonSchema>() -> Result<Self, SchemaError> {
        let settings = SchemaSettings::draft07().with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        });
        let root = settings.into_generator().into_root_schema_for::<P>();
        let mut document =
            serde_json::to_value(&root).map_err(|e| SchemaError::Encode(e.to_string()))?;
        if let Some(object) = document.as_object_mut() {
            object.remove("title");
        }
        Self::from_document(document)
    }

    /// Compile a hand-written document.
    ///
    /// # Errors
    /// Returns [`SchemaError::Compile`] if the document is not a valid schema.
    pub fn from_document(document: Value) -> Result<Self, SchemaError> {
        let validator =
            JSONSchema::compile(&document).map_err(|e| SchemaError::Compile(e.to_string()))?;
        Ok(Self {
            document,
            validator,
        })
    }

    /// The JSON Schema document published to the model.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Check `raw` against the schema, reporting every violated field.
    pub fn check(&self, raw: &Value) -> Result<(), ValidationFailure> {
        let raw = normalize(raw);
        let result = self.validator.validate(&raw);
        match result {
            Ok(()) => Ok(()),
            Err(errors) => {
                let issues = errors
                    .map(|error| FieldIssue {
                        field: field_name(&error.instance_path.to_string()),
                        reason: error.to_string(),
                    })
                    .collect::<Vec<_>>();
                Err(ValidationFailure { issues })
            }
        }
    }

    /// Validate `raw` and decode it into the typed parameters.
    pub fn parse<P: DeserializeOwned>(&self, raw: &Value) -> Result<P, ValidationFailure> {
        self.check(raw)?;
        serde_path_to_error::deserialize(normalize(raw)).map_err(|error| {
            let field = if error.path().iter().next().is_none() {
                ROOT_FIELD.to_string()
            } else {
                error.path().to_string()
            };
            ValidationFailure::single(field, error.inner().to_string())
        })
    }
}

impl fmt::Debug for ParameterSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Models often send `null` for tools without arguments.
fn normalize(raw: &Value) -> Value {
    match raw {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    }
}

/// `/sessions/0/kind` -> `sessions.0.kind`, empty pointer -> `$`.
fn field_name(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        ROOT_FIELD.to_string()
    } else {
        trimmed.replace('/', ".")
    }
}
