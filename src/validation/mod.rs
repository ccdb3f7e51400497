//! Request body validation. Validators run before any repository call and turn
//! a raw JSON body into a typed request.

pub mod parameters;
pub mod users;

pub use parameters::{validate_create_flag, validate_update_flag, CreateFlagRequest, UpdateFlagRequest};
pub use users::{validate_create_user, validate_update_user, CreateUserRequest, UpdateUserRequest};

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(String),

    #[error("{message}")]
    Field { field: String, message: String },

    #[error("{0}")]
    Body(String),
}

impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            ValidationError::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Presence of a key in a partial update body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    /// `Some` only for a supplied non-null value
    pub fn value(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

pub type JsonObject = Map<String, Value>;

/// Parse a request body into a non-empty JSON object
pub fn parse_object(body: Option<&str>) -> Result<JsonObject, ValidationError> {
    let body = body.map(str::trim).unwrap_or_default();
    if body.is_empty() {
        return Err(ValidationError::Body("Request body is required".to_string()));
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    match value {
        Value::Object(map) if map.is_empty() => {
            Err(ValidationError::Body("Request body is required".to_string()))
        }
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::Body("Request body must be a JSON object".to_string())),
    }
}

pub(crate) fn patch<'a>(body: &'a JsonObject, key: &str) -> Patch<&'a Value> {
    match body.get(key) {
        None => Patch::Absent,
        Some(Value::Null) => Patch::Null,
        Some(v) => Patch::Value(v),
    }
}

pub(crate) fn required<'a>(body: &'a JsonObject, key: &str) -> Result<&'a Value, ValidationError> {
    match patch(body, key) {
        Patch::Value(v) => Ok(v),
        _ => Err(ValidationError::field(key, format!("Field '{}' is required", key))),
    }
}

pub(crate) fn as_string(key: &str, value: &Value) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::field(key, format!("Field '{}' must be a string", key)))
}

pub(crate) fn as_non_empty_string(key: &str, value: &Value) -> Result<String, ValidationError> {
    let s = as_string(key, value).ok().filter(|s| !s.trim().is_empty());
    s.ok_or_else(|| ValidationError::field(key, format!("Field '{}' must be a non-empty string", key)))
}

pub(crate) fn as_bool(key: &str, value: &Value) -> Result<bool, ValidationError> {
    value
        .as_bool()
        .ok_or_else(|| ValidationError::field(key, format!("Field '{}' must be a boolean", key)))
}

/// Optional string field where `null` is rejected
pub(crate) fn optional_string(body: &JsonObject, key: &str) -> Result<Option<String>, ValidationError> {
    match patch(body, key) {
        Patch::Absent => Ok(None),
        Patch::Null => Err(ValidationError::field(key, format!("Field '{}' must not be null", key))),
        Patch::Value(v) => as_string(key, v).map(Some),
    }
}
