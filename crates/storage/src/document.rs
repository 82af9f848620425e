//! Typed field values and documents as the store encodes them.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

/// Field name to value map of one document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single typed field value.
///
/// On the wire every value is an object with one key naming its type, e.g.
/// `{"integerValue": "5"}`. Integers travel as decimal strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit integer
    Integer(i64),
    /// Double precision float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Boolean
    Boolean(bool),
    /// RFC 3339 timestamp, kept as text
    Timestamp(String),
    /// Explicit null
    Null,
}

impl FieldValue {
    /// Encode as the store's typed JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Integer(n) => json!({ "integerValue": n.to_string() }),
            FieldValue::Double(d) => json!({ "doubleValue": d }),
            FieldValue::String(s) => json!({ "stringValue": s }),
            FieldValue::Boolean(b) => json!({ "booleanValue": b }),
            FieldValue::Timestamp(t) => json!({ "timestampValue": t }),
            FieldValue::Null => json!({ "nullValue": null }),
        }
    }

    /// Decode a typed JSON value. Unknown or malformed values give `None`.
    ///
    /// Integers are accepted both as strings and as bare numbers.
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if let Some(v) = map.get("integerValue") {
            return match v {
                Value::String(s) => s.trim().parse().ok().map(FieldValue::Integer),
                Value::Number(n) => n.as_i64().map(FieldValue::Integer),
                _ => None,
            };
        }
        if let Some(v) = map.get("doubleValue") {
            return match v {
                Value::String(s) => s.trim().parse().ok().map(FieldValue::Double),
                Value::Number(n) => n.as_f64().map(FieldValue::Double),
                _ => None,
            };
        }
        if let Some(v) = map.get("stringValue") {
            return v.as_str().map(|s| FieldValue::String(s.to_string()));
        }
        if let Some(v) = map.get("booleanValue") {
            return v.as_bool().map(FieldValue::Boolean);
        }
        if let Some(v) = map.get("timestampValue") {
            return v.as_str().map(|s| FieldValue::Timestamp(s.to_string()));
        }
        if map.contains_key("nullValue") {
            return Some(FieldValue::Null);
        }
        None
    }

    /// Integer content, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// String content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

/// Encode a field map as the `fields` object of a request body.
pub fn fields_to_json(fields: &Fields) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();
    Value::Object(map)
}

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Full resource name, `projects/.../documents/<collection>/<id>[/...]`
    pub name: String,

    /// Decoded fields; undecodable values are dropped
    pub fields: Fields,
}

impl Document {
    /// Decode a document object. A document without a name is rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let fields = value
            .get("fields")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| FieldValue::from_json(v).map(|fv| (k.clone(), fv)))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { name, fields })
    }

    /// Last path segment of the name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Integer value of `field`, if present and an integer.
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(FieldValue::as_integer)
    }

    /// Encode back to the wire shape.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "fields": fields_to_json(&self.fields),
        })
    }
}
