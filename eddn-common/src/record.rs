use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single event as read from the journal, or assembled from CAPI documents.
///
/// Fields keep their insertion order. Every transformation consumes the record and returns a
/// new one, so a stage never mutates a copy that another stage or caller still holds:
///
/// ```
/// use eddn_common::Record;
/// use serde_json::json;
///
/// let record = Record::from_value(json!({"StarSystem": "Sol", "Progress": 0.5})).unwrap();
/// let scrubbed = record.clone().without("Progress").rename("StarSystem", "systemName");
///
/// assert_eq!(record.get_str("StarSystem"), Some("Sol"));
/// assert_eq!(scrubbed.get_str("systemName"), Some("Sol"));
/// assert!(!scrubbed.contains_key("Progress"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Record(map)),
            _ => None,
        }
    }

    /// Serialize any struct into a record. Fails if it does not serialize to an object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(value)?)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Set `key`, replacing any previous value in place.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set `key` only if the record does not carry it yet.
    pub fn with_default(self, key: &str, value: impl Into<Value>) -> Self {
        if self.contains_key(key) {
            self
        } else {
            self.with(key, value)
        }
    }

    pub fn without(mut self, key: &str) -> Self {
        self.0.shift_remove(key);
        self
    }

    pub fn without_all(self, keys: &[&str]) -> Self {
        keys.iter().fold(self, |record, key| record.without(key))
    }

    /// Move the value under `from` to `to`. A missing `from` key leaves the record untouched.
    pub fn rename(mut self, from: &str, to: &str) -> Self {
        match self.0.shift_remove(from) {
            Some(value) => self.with(to, value),
            None => self,
        }
    }

    /// Replace the value under `key` with `f(value)`, if present.
    pub fn update(mut self, key: &str, f: impl FnOnce(Value) -> Value) -> Self {
        if let Some(value) = self.0.get_mut(key) {
            *value = f(value.take());
        }
        self
    }

    /// Split a field out of the record, returning what is left and the removed value.
    pub fn split_off(mut self, key: &str) -> (Self, Option<Value>) {
        let value = self.0.shift_remove(key);
        (self, value)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}
