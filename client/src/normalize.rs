//! Reference normalizer: flat type lists into id-keyed lookup tables.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ParleyError;

/// A record id as it appears upstream: integer or string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Read `field` from `record`.
    ///
    /// # Errors
    /// Returns [`ParleyError::MalformedRecord`] if the record is not an object,
    /// lacks the field, or holds something other than an integer or string.
    pub fn from_record(record: &Value, field: &str) -> Result<Self, ParleyError> {
        let value = record
            .as_object()
            .ok_or_else(|| ParleyError::malformed_record(field, "record is not a JSON object"))?
            .get(field)
            .ok_or_else(|| ParleyError::malformed_record(field, "field is missing"))?;
        Self::from_value(value).ok_or_else(|| {
            let reason = format!("expected integer or string id, got {value}");
            ParleyError::malformed_record(field, reason)
        })
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// The id as a JSON value, used to tag child records.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Id-keyed lookup table of type records, each without its id field.
pub type TypeMap = BTreeMap<RecordId, Map<String, Value>>;

/// Convert a flat list of records into a [`TypeMap`] keyed by `id_field`.
///
/// Ids are expected to be unique. When they are not, later records replace
/// earlier ones under the same id (last write wins).
///
/// # Errors
/// Returns [`ParleyError::MalformedRecord`] for a record that cannot be keyed.
pub fn normalize(records: Vec<Value>, id_field: &str) -> Result<TypeMap, ParleyError> {
    let mut map = TypeMap::new();
    for record in records {
        let id = RecordId::from_record(&record, id_field)?;
        let Value::Object(mut fields) = record else {
            continue;
        };
        fields.remove(id_field);
        map.insert(id, fields);
    }
    Ok(map)
}
