//! Tool registry: named handlers with declared parameter schemas.
//!
//! The registry is populated once at startup and read-only afterwards.
//! Arguments are checked against the declared parameters before a handler
//! runs, so handlers only ever see well-typed values with defaults applied.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{ToolError, ToolResult};

/// Type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// A JSON integer in the `i64` or `u64` range, or a whole-number float.
    Integer,
    /// A JSON string.
    String,
}

impl ParamType {
    /// Returns the JSON Schema type name.
    #[must_use]
    pub const fn schema_type(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    /// Checks a JSON value against this type.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch.
    pub fn check(self, value: &Value) -> Result<(), String> {
        let ok = match self {
            Self::Integer => integer_value(value).is_some(),
            Self::String => value.is_string(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "expected {}, got {}",
                self.schema_type(),
                value_type_name(value)
            ))
        }
    }
}

/// Reads a JSON number as an integer.
///
/// Accepts anything in the `i64` or `u64` range, plus whole-number floats
/// (`2.0`) within that same range. The sum of two such values always fits
/// in `i128`.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // whole and range-checked before the cast
pub fn integer_value(value: &Value) -> Option<i128> {
    const LOWEST: f64 = -9_223_372_036_854_775_808.0; // i64::MIN
    const HIGHEST: f64 = 18_446_744_073_709_551_615.0; // u64::MAX

    if let Some(n) = value.as_i64() {
        return Some(i128::from(n));
    }
    if let Some(n) = value.as_u64() {
        return Some(i128::from(n));
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && (LOWEST..=HIGHEST).contains(&f)).then(|| f as i128)
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A declared tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Expected type.
    pub param_type: ParamType,
    /// Human-readable description.
    pub description: String,
    /// Value used when the caller omits the parameter. `None` means required.
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Declares a required parameter.
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            default: None,
        }
    }

    /// Declares an optional parameter with a default value.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            default: Some(default),
        }
    }

    /// Returns `true` if the caller must supply this parameter.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Name, description and ordered parameter list of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Parameters in declaration order.
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    /// Creates a definition with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Renders the parameter list as a JSON Schema object.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for spec in &self.params {
            let mut property = json!({
                "type": spec.param_type.schema_type(),
                "description": spec.description,
            });
            if let (Some(default), Some(obj)) = (&spec.default, property.as_object_mut()) {
                obj.insert("default".to_string(), default.clone());
            }
            properties.insert(spec.name.clone(), property);

            if spec.is_required() {
                required.push(Value::String(spec.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Checks raw call arguments against the declared parameters.
    ///
    /// Missing optional parameters take their default. Arguments that are
    /// not declared are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgument`] if the arguments are not an
    /// object, a required parameter is missing, or a value has the wrong type.
    pub fn bind(&self, arguments: &Value) -> ToolResult<ToolArguments> {
        let empty = Map::new();
        let supplied = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(ToolError::invalid_argument(
                    "arguments",
                    format!("expected object, got {}", value_type_name(other)),
                ))
            }
        };

        let mut bound = Map::new();
        for spec in &self.params {
            let value = match (supplied.get(&spec.name), &spec.default) {
                (Some(value), _) => {
                    spec.param_type
                        .check(value)
                        .map_err(|message| ToolError::invalid_argument(&spec.name, message))?;
                    value.clone()
                }
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(ToolError::invalid_argument(
                        &spec.name,
                        "missing required parameter",
                    ))
                }
            };
            bound.insert(spec.name.clone(), value);
        }

        Ok(ToolArguments { values: bound })
    }
}

/// Arguments that passed validation, with defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    /// Returns an integer argument.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgument`] if the argument is absent or
    /// not an integer.
    pub fn integer(&self, name: &str) -> ToolResult<i128> {
        self.values
            .get(name)
            .and_then(integer_value)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected integer"))
    }

    /// Returns a string argument.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgument`] if the argument is absent or
    /// not a string.
    pub fn string(&self, name: &str) -> ToolResult<&str> {
        self.values
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected string"))
    }
}

/// Value returned by a tool handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// An integer result.
    Integer(i128),
    /// A text result.
    Text(String),
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A synchronous tool handler.
pub type ToolHandler = fn(&ToolArguments) -> ToolResult<ToolOutput>;

#[derive(Clone)]
struct RegisteredTool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

/// Registry of invocable tools, keyed by name in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateName`] if a tool with the same name is
    /// already registered. The existing tool is left untouched.
    pub fn register(&mut self, definition: ToolDefinition, handler: ToolHandler) -> ToolResult<()> {
        if self.tools.contains_key(&definition.name) {
            return Err(ToolError::DuplicateName {
                name: definition.name,
            });
        }

        tracing::debug!(tool = %definition.name, "Registered tool");
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool {
                definition,
                handler,
            },
        );
        Ok(())
    }

    /// Invokes a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] if no such tool is registered,
    /// [`ToolError::InvalidArgument`] if the arguments don't match the
    /// declared parameters, or whatever error the handler reports.
    pub fn invoke(&self, name: &str, arguments: &Value) -> ToolResult<ToolOutput> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;

        let bound = tool.definition.bind(arguments)?;
        tracing::debug!(tool = name, "Invoking tool");
        (tool.handler)(&bound)
    }

    /// Returns the tool definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().map(|tool| &tool.definition)
    }

    /// Returns `true` if a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
