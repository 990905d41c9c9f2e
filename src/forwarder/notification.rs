//! Inbound shapes: the runtime event wrapper, the notification body, and
//! the tagged [`FieldValue`] union that absorbs the string-vs-list
//! ambiguity of submitted form values.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Serverless runtime event. Only `body` is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeEvent {
    #[serde(default)]
    pub body: Option<String>,
}

/// Only the top level must be an object. Payload members are read
/// loosely so an unexpected type in one member never rejects the body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub payload: Option<Value>,
}

fn non_empty_object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object).filter(|m| !m.is_empty())
}

impl Notification {
    /// Parse a notification body. Absent or blank bodies parse as `{}`.
    pub fn parse(body: Option<&str>) -> Result<Self, serde_json::Error> {
        match body.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(text) => serde_json::from_str(text),
        }
    }

    fn payload_member(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref()?.as_object()?.get(key)
    }

    /// Empty when absent or not a string.
    #[must_use]
    pub fn form_name(&self) -> &str {
        self.payload_member("form_name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    #[must_use]
    pub fn created_at(&self) -> Option<&str> {
        self.payload_member("created_at")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Submitted fields, read from `data` and falling back to `fields` when
    /// `data` is absent, not an object, or empty.
    #[must_use]
    pub fn submitted_fields(&self) -> Option<&Map<String, Value>> {
        non_empty_object(self.payload_member("data"))
            .or_else(|| non_empty_object(self.payload_member("fields")))
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.submitted_fields()
            .and_then(|fields| fields.get(name))
            .and_then(FieldValue::from_json)
    }
}

/// A submitted value as delivered by the form product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl FieldValue {
    /// `null` and objects are treated as absent.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::List(items.iter().filter_map(scalar_text).collect())),
            other => scalar_text(other).map(Self::Text),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}
