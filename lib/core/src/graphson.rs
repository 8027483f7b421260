//! Graphson decoding.
//!
//! Vertices come back in one of two shapes:
//!
//! ```text
//! Flat   (SQL API):     { "id": "..", "Title": [ { "id": "..", "_value": "Avatar" } ] }
//! Nested (Gremlin API): { "id": "..", "properties": { "Title": [ { "id": "..", "value": "Avatar" } ] } }
//! ```
//!
//! Plain documents read through the SQL API decode as `Flat`: a property
//! without a `_value` entry falls back to its own text form.

use crate::entity::{Entity, FieldDef, FieldKind};
use crate::serializer::EntitySerializer;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// The two graph result layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphsonShape {
    /// Properties at the root, values under `_value`.
    Flat,
    /// Properties inside a `properties` object, values under `value`.
    Nested,
}

impl GraphsonShape {
    pub const PROPERTIES_KEY: &'static str = "properties";

    /// Key holding a property entry's value.
    #[inline]
    pub fn value_key(self) -> &'static str {
        match self {
            GraphsonShape::Flat => "_value",
            GraphsonShape::Nested => "value",
        }
    }

    /// Detect the shape of `node` and return its property container.
    ///
    /// Only a non-empty `properties` object whose entries are all lists of
    /// objects is read as `Nested`. Anything else under that key is an
    /// ordinary field named `properties` and the node is `Flat`.
    pub fn detect(node: &Map<String, Value>) -> (Self, &Map<String, Value>) {
        match node.get(Self::PROPERTIES_KEY) {
            Some(Value::Object(properties)) if is_property_container(properties) => {
                (GraphsonShape::Nested, properties)
            }
            _ => (GraphsonShape::Flat, node),
        }
    }

    /// Raw text of one property as read from the container.
    pub fn raw_value(self, property: &Value) -> String {
        let wrapped = property
            .as_array()
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.get(self.value_key()));
        text_form(wrapped.unwrap_or(property))
    }
}

fn is_property_container(properties: &Map<String, Value>) -> bool {
    !properties.is_empty()
        && properties.values().all(|entries| {
            entries
                .as_array()
                .is_some_and(|entries| entries.iter().all(Value::is_object))
        })
}

fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Convert raw graphson text into the JSON value a field setter expects.
pub fn coerce(kind: FieldKind, raw: &str) -> std::result::Result<Value, String> {
    match kind {
        FieldKind::Enum | FieldKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| e.to_string()),
        FieldKind::Float => {
            let f = raw.trim().parse::<f64>().map_err(|e| e.to_string())?;
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| format!("{f} is not a finite number"))
        }
        FieldKind::Bool => match raw.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            f if f.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            other => Err(format!("'{other}' is not a valid boolean")),
        },
        FieldKind::Text => Ok(Value::String(raw.to_string())),
        FieldKind::DateTime => DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| Value::String(dt.with_timezone(&Utc).to_rfc3339()))
            .map_err(|e| e.to_string()),
        FieldKind::Bytes | FieldKind::Complex => serde_json::from_str(raw).map_err(|e| e.to_string()),
    }
}

fn assign<T>(entity: &mut T, field: &FieldDef<T>, raw: String) -> Result<()> {
    let Some(set) = field.set else {
        return Ok(());
    };

    let coerced = coerce(field.kind, &raw).and_then(|value| set(entity, value).map_err(|e| e.to_string()));
    coerced.map_err(|cause| Error::FieldCoercion {
        field: field.name.to_string(),
        raw,
        cause,
    })
}

impl EntitySerializer {
    /// Rebuild an entity from a graph or document read result.
    ///
    /// `null` and `{}` decode to `None`. Properties with no matching settable
    /// field are skipped; fields with no matching property keep their default.
    pub fn decode<T: Entity + Default>(&self, node: &Value) -> Result<Option<T>> {
        let node = match node {
            Value::Null => return Ok(None),
            Value::Object(map) if map.is_empty() => return Ok(None),
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidDocument(format!(
                    "expected an object, found {}",
                    json_kind(other)
                )))
            }
        };

        let descriptor = self.descriptor::<T>()?;
        let (shape, container) = GraphsonShape::detect(node);

        let mut entity = T::default();
        for (name, property) in container {
            let Some(field) = descriptor.field(name) else {
                continue;
            };
            let raw = shape.raw_value(property);
            if raw.is_empty() {
                continue;
            }
            assign(&mut entity, field, raw)?;
        }

        Ok(Some(entity))
    }

    /// Decode every node of a result page, skipping empty nodes.
    pub fn decode_all<T: Entity + Default>(&self, nodes: &[Value]) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(entity) = self.decode(node)? {
                out.push(entity);
            }
        }
        Ok(out)
    }
}
