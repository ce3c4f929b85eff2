//! Declared argument schemas and their validator.
//!
//! Every tool and prompt carries an [`InputSchema`]. The dispatcher runs
//! [`InputSchema::validate`] before any handler sees the arguments, so
//! handlers only ever read from a checked [`Arguments`] map. The same
//! schema renders itself as the JSON Schema object advertised in
//! `tools/list`.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// JSON type a parameter must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// A JSON string.
    String,
    /// A JSON integer that fits in an `i64`.
    Integer,
    /// Any JSON number.
    Number,
}

impl ParamType {
    /// The JSON Schema name of this type.
    #[must_use]
    pub const fn json_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64(),
            Self::Number => value.is_number(),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Expected JSON type.
    pub kind: ParamType,
    /// Human-readable description.
    pub description: String,
    /// Whether the caller must supply it.
    pub required: bool,
    /// Allowed string values, if restricted.
    pub allowed: Option<Vec<String>>,
}

/// Ways in which arguments can fail validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// Arguments were supplied but are not a JSON object.
    #[error("arguments must be a JSON object")]
    NotAnObject,

    /// A required parameter is absent.
    #[error("missing required field '{name}'")]
    MissingField {
        /// Parameter name.
        name: String,
    },

    /// A parameter has the wrong JSON type.
    #[error("field '{name}' must be of type {expected}")]
    WrongType {
        /// Parameter name.
        name: String,
        /// Expected JSON Schema type name.
        expected: &'static str,
    },

    /// A parameter value is outside its declared set.
    #[error("field '{name}' must be one of: {}", .allowed.join(", "))]
    NotAllowed {
        /// Parameter name.
        name: String,
        /// Accepted values.
        allowed: Vec<String>,
    },

    /// A field was supplied that the schema does not declare.
    #[error("unexpected field '{name}'")]
    UnexpectedField {
        /// Field name.
        name: String,
    },
}

/// The declared shape of an argument object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSchema {
    params: Vec<Param>,
    additional_properties: bool,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSchema {
    /// An object schema with no parameters that tolerates extra fields.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            params: Vec::new(),
            additional_properties: true,
        }
    }

    /// Declares a required parameter.
    #[must_use]
    pub fn required(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.param(name, kind, description, true, None)
    }

    /// Declares an optional parameter.
    #[must_use]
    pub fn optional(self, name: &str, kind: ParamType, description: &str) -> Self {
        self.param(name, kind, description, false, None)
    }

    /// Declares a required string parameter restricted to `allowed`.
    #[must_use]
    pub fn required_enum(self, name: &str, allowed: &[&str], description: &str) -> Self {
        let allowed = allowed.iter().map(ToString::to_string).collect();
        self.param(name, ParamType::String, description, true, Some(allowed))
    }

    /// Rejects fields that are not declared.
    #[must_use]
    pub fn deny_additional(mut self) -> Self {
        self.additional_properties = false;
        self
    }

    fn param(
        mut self,
        name: &str,
        kind: ParamType,
        description: &str,
        required: bool,
        allowed: Option<Vec<String>>,
    ) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
            allowed,
        });
        self
    }

    /// Checks `arguments` against this schema.
    ///
    /// `null` (or an absent `arguments` field) is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self, arguments: &Value) -> Result<Arguments, SchemaViolation> {
        let map = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            _ => return Err(SchemaViolation::NotAnObject),
        };

        for param in &self.params {
            let Some(value) = map.get(&param.name) else {
                if param.required {
                    return Err(SchemaViolation::MissingField {
                        name: param.name.clone(),
                    });
                }
                continue;
            };

            if !param.kind.accepts(value) {
                return Err(SchemaViolation::WrongType {
                    name: param.name.clone(),
                    expected: param.kind.json_name(),
                });
            }

            if let (Some(allowed), Some(text)) = (&param.allowed, value.as_str()) {
                if !allowed.iter().any(|a| a == text) {
                    return Err(SchemaViolation::NotAllowed {
                        name: param.name.clone(),
                        allowed: allowed.clone(),
                    });
                }
            }
        }

        if !self.additional_properties {
            if let Some(extra) = map
                .keys()
                .find(|key| !self.params.iter().any(|p| &p.name == *key))
            {
                return Err(SchemaViolation::UnexpectedField {
                    name: extra.clone(),
                });
            }
        }

        Ok(Arguments(map))
    }

    /// Renders this schema as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut property = json!({
                "type": param.kind.json_name(),
                "description": param.description,
            });
            if let Some(allowed) = &param.allowed {
                property["enum"] = json!(allowed);
            }
            properties.insert(param.name.clone(), property);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        if !self.additional_properties {
            schema["additionalProperties"] = json!(false);
        }
        schema
    }
}

/// Arguments that passed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Returns a string argument.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns an integer argument.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// Returns a numeric argument.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    /// Returns a string argument the schema marks as required.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaViolation::MissingField`] if it is absent, which
    /// means the handler consumes a field its schema does not declare.
    pub fn require_str(&self, name: &str) -> Result<&str, SchemaViolation> {
        self.str(name).ok_or_else(|| SchemaViolation::MissingField {
            name: name.to_string(),
        })
    }

    /// Returns an integer argument the schema marks as required.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaViolation::MissingField`] if it is absent.
    pub fn require_integer(&self, name: &str) -> Result<i64, SchemaViolation> {
        self.integer(name).ok_or_else(|| SchemaViolation::MissingField {
            name: name.to_string(),
        })
    }

    /// Returns a numeric argument the schema marks as required.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaViolation::MissingField`] if it is absent.
    pub fn require_number(&self, name: &str) -> Result<f64, SchemaViolation> {
        self.number(name).ok_or_else(|| SchemaViolation::MissingField {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_schema() -> InputSchema {
        InputSchema::new()
            .required("title", ParamType::String, "The task title")
            .optional("description", ParamType::String, "Optional description")
    }

    #[test]
    fn accepts_required_and_optional() {
        let args = task_schema()
            .validate(&json!({"title": "Write tests", "description": "all of them"}))
            .unwrap();
        assert_eq!(args.str("title"), Some("Write tests"));
        assert_eq!(args.str("description"), Some("all of them"));
    }

    #[test]
    fn null_arguments_are_empty_object() {
        let schema = InputSchema::new().deny_additional();
        assert!(schema.validate(&Value::Null).is_ok());
    }

    #[test]
    fn missing_required_field() {
        let err = task_schema().validate(&json!({})).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::MissingField {
                name: "title".to_string()
            }
        );
    }

    #[test]
    fn wrong_type() {
        let err = task_schema().validate(&json!({"title": 5})).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::WrongType {
                name: "title".to_string(),
                expected: "string"
            }
        );
    }

    #[test]
    fn integer_rejects_fractions() {
        let schema = InputSchema::new().required("task_id", ParamType::Integer, "id");
        assert!(schema.validate(&json!({"task_id": 3})).is_ok());
        assert!(schema.validate(&json!({"task_id": 3.5})).is_err());
        assert!(schema.validate(&json!({"task_id": "3"})).is_err());

        let negative = schema.validate(&json!({"task_id": -1})).unwrap();
        assert_eq!(negative.require_integer("task_id"), Ok(-1));
        assert!(schema.validate(&json!({"task_id": u64::MAX})).is_err());
    }

    #[test]
    fn number_accepts_integers_and_floats() {
        let schema = InputSchema::new().required("a", ParamType::Number, "operand");
        assert_eq!(schema.validate(&json!({"a": 2})).unwrap().number("a"), Some(2.0));
        assert_eq!(
            schema.validate(&json!({"a": 2.5})).unwrap().number("a"),
            Some(2.5)
        );
    }

    #[test]
    fn enum_restriction() {
        let schema = InputSchema::new().required_enum("op", &["add", "subtract"], "operation");
        assert!(schema.validate(&json!({"op": "add"})).is_ok());
        let err = schema.validate(&json!({"op": "modulo"})).unwrap_err();
        assert!(err.to_string().contains("add, subtract"));
    }

    #[test]
    fn extra_fields_follow_declared_policy() {
        assert!(task_schema()
            .validate(&json!({"title": "t", "priority": 1}))
            .is_ok());

        let strict = InputSchema::new().deny_additional();
        let err = strict.validate(&json!({"verbose": true})).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::UnexpectedField {
                name: "verbose".to_string()
            }
        );
    }

    #[test]
    fn non_object_rejected() {
        let err = task_schema().validate(&json!(["title"])).unwrap_err();
        assert_eq!(err, SchemaViolation::NotAnObject);
    }

    #[test]
    fn json_schema_rendering() {
        let schema = InputSchema::new()
            .required_enum("operation", &["add", "divide"], "Operation")
            .optional("note", ParamType::String, "Free text")
            .deny_additional()
            .to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["operation"]["enum"], json!(["add", "divide"]));
        assert_eq!(schema["properties"]["note"]["type"], "string");
        assert_eq!(schema["required"], json!(["operation"]));
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn empty_schema_has_no_required_list() {
        let schema = InputSchema::new().to_json_schema();
        assert!(schema.get("required").is_none());
        assert!(schema.get("additionalProperties").is_none());
    }
}
