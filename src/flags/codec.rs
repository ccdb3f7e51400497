use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::split_key;
use crate::store::{ParameterKind, StoredParameter};

/// How clients should interpret a flag's `value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    Boolean,
    #[default]
    String,
    Integer,
    Double,
    Date,
    Time,
    DateTime,
    Json,
}

impl ValueType {
    pub const ALL: [ValueType; 8] = [
        ValueType::Boolean,
        ValueType::String,
        ValueType::Integer,
        ValueType::Double,
        ValueType::Date,
        ValueType::Time,
        ValueType::DateTime,
        ValueType::Json,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "BOOLEAN",
            ValueType::String => "STRING",
            ValueType::Integer => "INTEGER",
            ValueType::Double => "DOUBLE",
            ValueType::Date => "DATE",
            ValueType::Time => "TIME",
            ValueType::DateTime => "DATETIME",
            ValueType::Json => "JSON",
        }
    }

    /// Case-insensitive, so the older lower-case family still parses
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(ValueType::as_str).collect()
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ValueType::parse(&s).ok_or_else(|| de::Error::custom(format!("unknown value type '{}'", s)))
    }
}

/// Accepts either a JSON string or any native JSON value, which is kept as
/// its compact JSON text
fn value_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Err(de::Error::custom("value must not be null")),
        other => Ok(other.to_string()),
    }
}

/// RFC 3339, or a naive ISO 8601 timestamp taken as UTC
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_timestamp(&s).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s)))
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The value the record held before its most recent value change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousVersion {
    #[serde(deserialize_with = "value_text")]
    pub value: String,
    #[serde(deserialize_with = "timestamp")]
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_by: String,
}

/// Persisted form of a flag, stored as the parameter's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagEnvelope {
    pub id: String,
    #[serde(deserialize_with = "value_text")]
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "timestamp")]
    pub last_modified_at: DateTime<Utc>,
    #[serde(default)]
    pub last_modified_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<PreviousVersion>,
}

/// A flag as returned to API callers: the envelope plus where it lives
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRecord {
    #[serde(flatten)]
    pub envelope: FlagEnvelope,
    pub prefix: String,
    /// Full store key
    pub name: String,
    pub arn: String,
    pub parameter_store_type: ParameterKind,
}

impl FlagRecord {
    pub fn id(&self) -> &str {
        &self.envelope.id
    }

    pub fn value(&self) -> &str {
        &self.envelope.value
    }
}

/// Rebuild a record from a stored parameter. Values that are not a current
/// envelope fall back to a minimal record around the raw value.
pub fn decode(stored: &StoredParameter, root: &str) -> FlagRecord {
    let (prefix, id) = split_key(root, &stored.name).unwrap_or_else(|| {
        let id = stored.name.rsplit('/').next().unwrap_or_default();
        (String::new(), id.to_string())
    });

    let envelope = match serde_json::from_str::<FlagEnvelope>(&stored.value) {
        Ok(mut envelope) => {
            // The key is authoritative for identity
            envelope.id = id;
            envelope
        }
        Err(e) => {
            tracing::debug!("Parameter {} is not a flag envelope ({}), reading as legacy", stored.name, e);
            legacy_envelope(id, stored)
        }
    };

    FlagRecord {
        envelope,
        prefix,
        name: stored.name.clone(),
        arn: stored.arn.clone(),
        parameter_store_type: stored.kind,
    }
}

fn legacy_envelope(id: String, stored: &StoredParameter) -> FlagEnvelope {
    FlagEnvelope {
        id,
        value: stored.value.clone(),
        value_type: ValueType::default(),
        description: String::new(),
        last_modified_at: stored.last_modified,
        last_modified_by: String::new(),
        previous_version: None,
    }
}

pub fn encode(envelope: &FlagEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}
