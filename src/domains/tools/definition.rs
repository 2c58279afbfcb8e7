//! Static tool definitions.
//!
//! Tool schemas are declared as plain data rather than derived from Rust
//! types, so the published schema and the validation rules share one source.

use rmcp::model::Tool;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::error::ToolError;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
}

impl ParamKind {
    fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<i64>,
    pub description: &'static str,
}

/// Immutable description of a callable tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ParameterSpec],
}

/// A validated argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
}

/// Arguments that passed validation against a [`ToolDefinition`].
///
/// Optional parameters that were omitted (or sent as `null`) are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments {
    values: BTreeMap<&'static str, ArgValue>,
}

impl ValidatedArguments {
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }
}

/// JSON clients may send whole numbers as `3.0`; those count as integers.
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= 9.0e15)
            .map(|f| f as i64)
    })
}

impl ToolDefinition {
    /// Check `arguments` against the declared parameters.
    ///
    /// Required string parameters must be non-blank. Undeclared arguments are
    /// ignored.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<ValidatedArguments, ToolError> {
        let mut validated = ValidatedArguments::default();

        for param in self.parameters {
            let value = arguments.get(param.name).filter(|v| !v.is_null());

            let Some(value) = value else {
                if param.required {
                    return Err(ToolError::invalid_arguments(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
                continue;
            };

            let parsed = match param.kind {
                ParamKind::String => {
                    let s = value.as_str().ok_or_else(|| {
                        ToolError::invalid_arguments(format!(
                            "parameter '{}' must be a string",
                            param.name
                        ))
                    })?;
                    if param.required && s.trim().is_empty() {
                        return Err(ToolError::invalid_arguments(format!(
                            "parameter '{}' cannot be empty",
                            param.name
                        )));
                    }
                    ArgValue::String(s.trim().to_string())
                }
                ParamKind::Integer => {
                    let n = as_integer(value).ok_or_else(|| {
                        ToolError::invalid_arguments(format!(
                            "parameter '{}' must be an integer",
                            param.name
                        ))
                    })?;
                    ArgValue::Integer(n)
                }
            };

            validated.values.insert(param.name, parsed);
        }

        for key in arguments.keys() {
            if !self.parameters.iter().any(|p| p.name == key) {
                debug!("Ignoring undeclared argument '{}' for tool {}", key, self.name);
            }
        }

        Ok(validated)
    }

    /// JSON schema of the tool's input object.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for param in self.parameters {
            let mut schema = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if let (Some(default), Some(obj)) = (param.default, schema.as_object_mut()) {
                obj.insert("default".to_string(), json!(default));
            }
            properties.insert(param.name.to_string(), schema);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), json!(required));
        schema
    }

    /// Create a Tool model for this definition (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name, self.description, Arc::new(self.input_schema()))
    }
}
