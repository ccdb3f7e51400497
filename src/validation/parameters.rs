use serde_json::Value;

use super::{
    as_non_empty_string, as_string, optional_string, parse_object, patch, required, JsonObject, Patch,
    ValidationError,
};
use crate::flags::ValueType;
use crate::store::ParameterKind;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFlagRequest {
    pub id: String,
    pub value: String,
    pub value_type: ValueType,
    pub description: String,
    pub last_modified_by: Option<String>,
    pub store_type: ParameterKind,
    pub prefix: Option<String>,
}

/// At least one field is not `Absent`. Only `description` may be `Null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateFlagRequest {
    pub value: Patch<String>,
    pub description: Patch<String>,
    pub value_type: Patch<ValueType>,
    pub last_modified_by: Patch<String>,
    pub prefix: Patch<String>,
}

pub fn validate_create_flag(body: Option<&str>) -> Result<CreateFlagRequest, ValidationError> {
    let body = parse_object(body)?;

    let id = as_non_empty_string("id", required(&body, "id")?)?;
    if id.contains('/') {
        return Err(ValidationError::field("id", "Field 'id' must not contain '/' character"));
    }
    let raw_value = required(&body, "value")?;
    let value_type = value_type("type", required(&body, "type")?)?;
    let value = value_text(raw_value, Some(value_type))?;

    let store_type = match patch(&body, "parameterStoreType") {
        Patch::Absent => ParameterKind::default(),
        Patch::Null => return Err(store_type_error()),
        Patch::Value(v) => v
            .as_str()
            .and_then(ParameterKind::parse)
            .ok_or_else(store_type_error)?,
    };

    Ok(CreateFlagRequest {
        id,
        value,
        value_type,
        description: optional_string(&body, "description")?.unwrap_or_default(),
        last_modified_by: optional_string(&body, "lastModifiedBy")?,
        store_type,
        prefix: optional_prefix(&body)?,
    })
}

pub fn validate_update_flag(body: Option<&str>) -> Result<UpdateFlagRequest, ValidationError> {
    let body = parse_object(body)?;

    let value_type = match patch(&body, "type") {
        Patch::Absent => Patch::Absent,
        Patch::Null => return Err(null_error("type")),
        Patch::Value(v) => Patch::Value(self::value_type("type", v)?),
    };

    let value = match patch(&body, "value") {
        Patch::Absent => Patch::Absent,
        Patch::Null => return Err(null_error("value")),
        Patch::Value(v) => Patch::Value(value_text(v, value_type.clone().value())?),
    };

    let description = match patch(&body, "description") {
        Patch::Value(v) => Patch::Value(as_string("description", v)?),
        other => other.map(|_| String::new()),
    };

    let last_modified_by = match optional_string(&body, "lastModifiedBy")? {
        Some(s) => Patch::Value(s),
        None => Patch::Absent,
    };

    let prefix = match optional_prefix(&body)? {
        Some(p) => Patch::Value(p),
        None => Patch::Absent,
    };

    let request = UpdateFlagRequest {
        value,
        description,
        value_type,
        last_modified_by,
        prefix,
    };
    if request.value.is_absent()
        && request.description.is_absent()
        && request.value_type.is_absent()
        && request.last_modified_by.is_absent()
        && request.prefix.is_absent()
    {
        return Err(ValidationError::Body(
            "At least one of 'value', 'description', 'type', 'lastModifiedBy' or 'prefix' must be provided"
                .to_string(),
        ));
    }
    Ok(request)
}

/// Strings pass through; other JSON values are kept as JSON text only for
/// the JSON type
fn value_text(value: &Value, value_type: Option<ValueType>) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Err(null_error("value")),
        other if value_type == Some(ValueType::Json) => Ok(other.to_string()),
        _ => Err(ValidationError::field("value", "Field 'value' must be a string")),
    }
}

fn value_type(key: &str, value: &Value) -> Result<ValueType, ValidationError> {
    value.as_str().and_then(ValueType::parse).ok_or_else(|| {
        ValidationError::field(
            key,
            format!("Field '{}' must be one of: {}", key, ValueType::names().join(", ")),
        )
    })
}

fn optional_prefix(body: &JsonObject) -> Result<Option<String>, ValidationError> {
    let Some(prefix) = optional_string(body, "prefix")? else {
        return Ok(None);
    };
    if prefix.is_empty() {
        return Ok(None);
    }
    let valid = prefix != "."
        && prefix != ".."
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid {
        return Err(ValidationError::field(
            "prefix",
            "Field 'prefix' must be a single path segment of letters, digits, '_', '.' or '-'",
        ));
    }
    Ok(Some(prefix))
}

fn store_type_error() -> ValidationError {
    let kinds: Vec<_> = ParameterKind::ALL.iter().map(ParameterKind::as_str).collect();
    ValidationError::field(
        "parameterStoreType",
        format!("Field 'parameterStoreType' must be one of: {}", kinds.join(", ")),
    )
}

fn null_error(key: &str) -> ValidationError {
    ValidationError::field(key, format!("Field '{}' must not be null", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_id_value_and_type() {
        let ok = validate_create_flag(Some(
            r#"{"id":"DARK_MODE","value":"true","type":"BOOLEAN","lastModifiedBy":"a@x.com"}"#,
        ))
        .unwrap();
        assert_eq!(ok.id, "DARK_MODE");
        assert_eq!(ok.value_type, ValueType::Boolean);
        assert_eq!(ok.store_type, ParameterKind::String);
        assert_eq!(ok.last_modified_by.as_deref(), Some("a@x.com"));
        assert_eq!(ok.prefix, None);

        for body in [
            r#"{"value":"1","type":"STRING"}"#,
            r#"{"id":"X","type":"STRING"}"#,
            r#"{"id":"X","value":"1"}"#,
        ] {
            let err = validate_create_flag(Some(body)).unwrap_err();
            assert!(err.to_string().ends_with("is required"), "{}", err);
        }
    }

    #[test]
    fn create_rejects_bad_fields() {
        let cases = [
            (r#"{"id":"a/b","value":"1","type":"STRING"}"#, "id"),
            (r#"{"id":" ","value":"1","type":"STRING"}"#, "id"),
            (r#"{"id":"X","value":1,"type":"INTEGER"}"#, "value"),
            (r#"{"id":"X","value":"1","type":"NUMBER"}"#, "type"),
            (r#"{"id":"X","value":"1","type":"STRING","description":3}"#, "description"),
            (r#"{"id":"X","value":"1","type":"STRING","parameterStoreType":"Blob"}"#, "parameterStoreType"),
            (r#"{"id":"X","value":"1","type":"STRING","prefix":"a/b"}"#, "prefix"),
            (r#"{"id":"X","value":"1","type":"STRING","prefix":".."}"#, "prefix"),
        ];
        for (body, field) in cases {
            let err = validate_create_flag(Some(body)).unwrap_err();
            assert_eq!(err.field_name(), Some(field), "{}", body);
        }
    }

    #[test]
    fn json_type_accepts_native_values() {
        let req = validate_create_flag(Some(
            r#"{"id":"CFG","value":{"a":[1,2]},"type":"json","prefix":"api","parameterStoreType":"SecureString"}"#,
        ))
        .unwrap();
        assert_eq!(req.value, r#"{"a":[1,2]}"#);
        assert_eq!(req.value_type, ValueType::Json);
        assert_eq!(req.store_type, ParameterKind::SecureString);
        assert_eq!(req.prefix.as_deref(), Some("api"));
    }

    #[test]
    fn update_tracks_presence() {
        let req = validate_update_flag(Some(r#"{"value":"false"}"#)).unwrap();
        assert_eq!(req.value, Patch::Value("false".to_string()));
        assert!(req.description.is_absent());

        let req = validate_update_flag(Some(r#"{"description":null}"#)).unwrap();
        assert_eq!(req.description, Patch::Null);

        let req = validate_update_flag(Some(r#"{"prefix":"ui"}"#)).unwrap();
        assert_eq!(req.prefix, Patch::Value("ui".to_string()));
    }

    #[test]
    fn update_rejects_nulls_and_empty_bodies() {
        assert!(validate_update_flag(Some(r#"{"value":null}"#)).is_err());
        assert!(validate_update_flag(Some(r#"{"type":null}"#)).is_err());
        assert!(validate_update_flag(Some(r#"{"lastModifiedBy":null}"#)).is_err());
        assert!(matches!(
            validate_update_flag(Some(r#"{"unrelated":1}"#)),
            Err(ValidationError::Body(_))
        ));
        assert!(matches!(validate_update_flag(Some("{}")), Err(ValidationError::Body(_))));
    }
}
