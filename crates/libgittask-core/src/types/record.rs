use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TaskError;

/// Stable task identifier
pub const FIELD_ID: &str = "id";
/// Workflow status, one of the configured statuses
pub const FIELD_STATUS: &str = "status";
/// Creation time, epoch milliseconds
pub const FIELD_CREATED_AT: &str = "createdAt";
/// Last update time, epoch milliseconds
pub const FIELD_UPDATED_AT: &str = "updatedAt";
/// Transient sync state; never part of a stored record
pub const FIELD_GIT_STATUS: &str = "gitStatus";

/// A task record: field name to JSON value, in insertion order.
///
/// Records are replaced wholesale on save; there are no partial field
/// patches at this layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self, TaskError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(TaskError::InvalidArgs(format!(
                "a task must be a JSON object, got {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a field, keeping the order of the remaining ones
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The record ID, if it is a string
    pub fn id(&self) -> Option<&str> {
        self.0.get(FIELD_ID).and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.0.get(FIELD_STATUS).and_then(Value::as_str)
    }

    pub fn created_at(&self) -> Option<i64> {
        self.0.get(FIELD_CREATED_AT).and_then(timestamp_ms)
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.0.get(FIELD_UPDATED_AT).and_then(timestamp_ms)
    }

    /// True when the field is absent, null, or an empty string
    pub fn is_blank(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn timestamp_ms(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

/// Short name of a JSON value's type, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
