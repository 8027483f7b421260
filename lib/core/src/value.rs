use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

/// A single field value as it travels through the mappers.
///
/// Enumerations are carried as their ordinal in [`DocValue::Int`].
/// Anything that is not a scalar lands in [`DocValue::Nested`] and is treated
/// as opaque JSON by the encoders.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    Bytes(Bytes),
    Nested(Value),
}

impl DocValue {
    /// Wrap any serializable value as nested JSON.
    ///
    /// Values that fail to serialize (maps with non-string keys and the like)
    /// become `Null` with a warning; use [`try_nested`](Self::try_nested) to
    /// get the error instead.
    pub fn nested<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::try_nested(value).unwrap_or_else(|e| {
            warn!("dropping nested value that failed to serialize: {}", e);
            DocValue::Null
        })
    }

    pub fn try_nested<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(DocValue::Nested)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null)
    }

    /// Values the graph wire format can carry without a text round trip.
    #[inline]
    pub fn is_graph_scalar(&self) -> bool {
        matches!(
            self,
            DocValue::Bool(_)
                | DocValue::Int(_)
                | DocValue::Float(_)
                | DocValue::Text(_)
                | DocValue::DateTime(_)
        )
    }

    /// Text form used for id, label and partition key values.
    /// `Null` has no text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            DocValue::Null => None,
            DocValue::Bool(b) => Some(b.to_string()),
            DocValue::Int(i) => Some(i.to_string()),
            DocValue::Float(f) => Some(f.to_string()),
            DocValue::Text(s) => Some(s.clone()),
            DocValue::DateTime(dt) => Some(format_datetime(dt)),
            DocValue::Bytes(_) | DocValue::Nested(_) => serde_json::to_string(self).ok(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DocValue::Null => Value::Null,
            DocValue::Bool(b) => Value::Bool(*b),
            DocValue::Int(i) => Value::from(*i),
            DocValue::Float(f) => Value::from(*f),
            DocValue::Text(s) => Value::String(s.clone()),
            DocValue::DateTime(dt) => Value::String(format_datetime(dt)),
            DocValue::Bytes(b) => Value::from(b.to_vec()),
            DocValue::Nested(v) => v.clone(),
        }
    }
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Serialize for DocValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocValue::Null => serializer.serialize_unit(),
            DocValue::Bool(b) => serializer.serialize_bool(*b),
            DocValue::Int(i) => serializer.serialize_i64(*i),
            DocValue::Float(f) => serializer.serialize_f64(*f),
            DocValue::Text(s) => serializer.serialize_str(s),
            DocValue::DateTime(dt) => serializer.serialize_str(&format_datetime(dt)),
            DocValue::Bytes(b) => serializer.collect_seq(b.iter()),
            DocValue::Nested(v) => v.serialize(serializer),
        }
    }
}

impl From<bool> for DocValue {
    fn from(b: bool) -> Self {
        DocValue::Bool(b)
    }
}

macro_rules! int_doc_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DocValue {
                fn from(i: $t) -> Self {
                    DocValue::Int(i as i64)
                }
            }
        )*
    };
}

int_doc_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for DocValue {
    fn from(f: f32) -> Self {
        DocValue::Float(f as f64)
    }
}

impl From<f64> for DocValue {
    fn from(f: f64) -> Self {
        DocValue::Float(f)
    }
}

impl From<String> for DocValue {
    fn from(s: String) -> Self {
        DocValue::Text(s)
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        DocValue::Text(s.to_string())
    }
}

impl From<&String> for DocValue {
    fn from(s: &String) -> Self {
        DocValue::Text(s.clone())
    }
}

impl From<DateTime<Utc>> for DocValue {
    fn from(dt: DateTime<Utc>) -> Self {
        DocValue::DateTime(dt)
    }
}

impl From<Bytes> for DocValue {
    fn from(b: Bytes) -> Self {
        DocValue::Bytes(b)
    }
}

impl From<Value> for DocValue {
    fn from(v: Value) -> Self {
        DocValue::Nested(v)
    }
}

impl<T: Into<DocValue>> From<Option<T>> for DocValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(DocValue::Null)
    }
}
