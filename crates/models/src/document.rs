use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;

/// Untyped record as the document database hands it out: the document id plus
/// every stored field, serialized flat as `{id, ...fields}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Build a document, dropping any `id` key from `fields` so the flattened
    /// form never carries it twice.
    pub fn new(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        Self { id: id.into(), fields }
    }

    /// Parse a JSON object that carries its own string `id`.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        match value {
            Value::Object(mut map) => match map.remove("id") {
                Some(Value::String(id)) if !id.trim().is_empty() => Ok(Self::new(id.trim(), map)),
                _ => Err(ModelError::Validation("document id must be a non-empty string".into())),
            },
            _ => Err(ModelError::Validation("document must be a JSON object".into())),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        if field == "id" {
            return None;
        }
        self.fields.get(field)
    }

    /// String value of `field`, treating `id` as a regular string field.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        if field == "id" {
            return Some(self.id.as_str());
        }
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert("id".into(), Value::String(self.id.clone()));
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }

    /// Decode into a typed record.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ModelError> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

/// Deep-merge `patch` into `target`: nested objects merge key by key, every
/// other value (arrays included) replaces what was there.
pub fn merge_json(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, incoming) in patch {
        match (target.get_mut(&key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_json(existing, nested),
            (_, incoming) => {
                target.insert(key, incoming);
            }
        }
    }
}

/// JavaScript-style truthiness, used by presence filters.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
