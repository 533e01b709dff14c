//! Generic document representation shared by every collection.
//!
//! A [`Document`] is a unique id plus an ordered field map. Collections store
//! documents exclusively; readers always get copies, so nothing outside the
//! store holds a live reference into collection state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered field map of a document (field name to JSON value).
pub type Fields = Map<String, Value>;

/// A named-field record with a unique id within its collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, the collection key.
    pub id: String,
    /// All remaining fields, in declaration order.
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Document {
            id: id.into(),
            fields,
        }
    }

    /// Returns the value of `field`. The id is addressable as `"id"`.
    pub fn get(&self, field: &str) -> Option<Value> {
        if field == "id" {
            return Some(Value::String(self.id.clone()));
        }
        self.fields.get(field).cloned()
    }

    /// Merges `update` into this document, replacing existing fields and
    /// appending new ones. The id is never touched.
    pub fn merge(&mut self, update: &Fields) {
        for (key, value) in update {
            if key == "id" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Flattens the document into the JSON record shape the aggregation
    /// executor threads between stages: one object with `id` inlined.
    pub fn to_record(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert("id".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// Resolves a dotted field path (`"c.brand_id"`) against a JSON record,
/// returning `Null` when any segment is absent.
pub fn resolve_path(record: &Value, path: &str) -> Value {
    let mut current = record;
    for part in path.split('.') {
        match current {
            Value::Object(map) => match map.get(part) {
                Some(value) => current = value,
                None => return Value::Null,
            },
            _ => return Value::Null,
        }
    }
    current.clone()
}
