/// Request body schemas
///
/// A schema is a typed body (`serde` + `validator`) plus a declarative
/// field list describing which keys exist, which are required and what JSON
/// type each holds. [`parse`] checks the raw JSON against the field list
/// first (missing, empty, wrong type, unknown keys, at-least-one-field) and
/// only then deserializes and runs the value rules. Every violation found
/// in a stage is reported, in field order.
///
/// # Example
///
/// ```
/// use contacts_shared::validation::{parse, schemas::LoginUser};
/// use serde_json::json;
///
/// let err = parse::<LoginUser>(json!({ "email": "" })).unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "'email' value cannot be empty; 'password' value is required"
/// );
/// ```

pub mod rules;
pub mod schemas;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

/// JSON type a field must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
}

/// One key of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }
}

/// A typed request body with a declared shape
pub trait Schema: DeserializeOwned + Validate {
    /// Accepted keys, in reporting order
    const FIELDS: &'static [Field];

    /// When true, at least one of `FIELDS` must be present (partial updates)
    const REQUIRE_ANY: bool = false;
}

/// All rule violations for one body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .violations.join("; "))]
pub struct SchemaError {
    pub violations: Vec<String>,
}

impl SchemaError {
    fn single(message: impl Into<String>) -> Self {
        Self { violations: vec![message.into()] }
    }
}

/// Validates and converts a raw JSON body into `T`
///
/// # Errors
///
/// Returns every violation of the first failing stage
pub fn parse<T: Schema>(body: Value) -> Result<T, SchemaError> {
    let object = match &body {
        Value::Object(map) => map,
        _ => return Err(SchemaError::single("body must be a JSON object")),
    };

    let violations = shape_violations(object, T::FIELDS, T::REQUIRE_ANY);
    if !violations.is_empty() {
        return Err(SchemaError { violations });
    }

    let value: T = serde_json::from_value(body)
        .map_err(|e| SchemaError::single(format!("body is malformed: {}", e)))?;

    if let Err(errors) = value.validate() {
        let field_errors = errors.field_errors();
        let violations = T::FIELDS
            .iter()
            .filter_map(|field| field_errors.get(field.name))
            .flat_map(|errs| errs.iter())
            .map(|err| match &err.message {
                Some(message) => message.to_string(),
                None => err.code.to_string(),
            })
            .collect();
        return Err(SchemaError { violations });
    }

    Ok(value)
}

fn quoted_names(fields: &[Field]) -> String {
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    format!("'{}'", names.join("', '"))
}

fn shape_violations(object: &Map<String, Value>, fields: &[Field], require_any: bool) -> Vec<String> {
    let mut violations = Vec::new();

    for field in fields {
        match object.get(field.name) {
            None if field.required => {
                violations.push(format!("'{}' value is required", field.name));
            }
            None => {}
            Some(value) => match (field.kind, value) {
                (FieldKind::String, Value::String(s)) if s.is_empty() => {
                    violations.push(format!("'{}' value cannot be empty", field.name));
                }
                (FieldKind::String, Value::String(_)) | (FieldKind::Boolean, Value::Bool(_)) => {}
                (FieldKind::String, _) => {
                    violations.push(format!("'{}' must be a string", field.name));
                }
                (FieldKind::Boolean, _) => {
                    violations.push(format!("'{}' must be a boolean", field.name));
                }
            },
        }
    }

    let mut unknown: Vec<&String> = object
        .keys()
        .filter(|key| !fields.iter().any(|f| f.name == key.as_str()))
        .collect();
    unknown.sort();
    for key in unknown {
        violations.push(format!(
            "an unrecognized field '{}' was provided, valid fields are: {}",
            key,
            quoted_names(fields)
        ));
    }

    if require_any && !fields.iter().any(|f| object.contains_key(f.name)) {
        violations.push(format!(
            "body must have at least one field, valid fields are: {}",
            quoted_names(fields)
        ));
    }

    violations
}
