use crate::value::DocValue;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Names of the three reserved keys written to every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerConfig {
    #[serde(default = "default_id_key")]
    pub id_key: String,
    #[serde(default = "default_label_key")]
    pub label_key: String,
    #[serde(default = "default_partition_key_key")]
    pub partition_key_key: String,
}

fn default_id_key() -> String {
    "id".to_string()
}

fn default_label_key() -> String {
    "label".to_string()
}

fn default_partition_key_key() -> String {
    "PartitionKey".to_string()
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            id_key: default_id_key(),
            label_key: default_label_key(),
            partition_key_key: default_partition_key_key(),
        }
    }
}

impl SerializerConfig {
    /// Default key names with a custom partition key property.
    pub fn with_partition_key(partition_key_key: impl Into<String>) -> Self {
        Self {
            partition_key_key: partition_key_key.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive match against any reserved key.
    pub fn is_reserved(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.id_key)
            || name.eq_ignore_ascii_case(&self.label_key)
            || name.eq_ignore_ascii_case(&self.partition_key_key)
    }
}

/// Identity triple of a vertex, used as an edge endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphItemBase {
    pub id: String,
    pub label: String,
    pub partition_key: String,
}

impl GraphItemBase {
    pub fn new(id: impl Into<String>, label: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            partition_key: partition_key.into(),
        }
    }
}

/// Flat, insertion-ordered property bag.
///
/// The reserved values are kept apart from the other properties so encoders
/// never have to look them up by (configurable) name.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    keys: SerializerConfig,
    id: String,
    label: String,
    partition_key: String,
    properties: Vec<(String, DocValue)>,
}

impl Document {
    pub(crate) fn new(keys: SerializerConfig, id: String, label: String, partition_key: String) -> Self {
        Self {
            keys,
            id,
            label,
            partition_key,
            properties: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    #[inline]
    pub fn keys(&self) -> &SerializerConfig {
        &self.keys
    }

    pub fn graph_item_base(&self) -> GraphItemBase {
        GraphItemBase::new(&self.id, &self.label, &self.partition_key)
    }

    /// Non-reserved properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Lookup by exact key; reserved keys resolve to their text values.
    pub fn get(&self, key: &str) -> Option<DocValue> {
        if key == self.keys.id_key {
            return Some(DocValue::Text(self.id.clone()));
        }
        if key == self.keys.label_key {
            return Some(DocValue::Text(self.label.clone()));
        }
        if key == self.keys.partition_key_key {
            return Some(DocValue::Text(self.partition_key.clone()));
        }
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    /// Insert or replace a property, keeping its first position.
    ///
    /// Reserved keys (matched case-insensitively) update the id, label or
    /// partition key instead; a value with no text form leaves them as is.
    pub fn insert(&mut self, key: impl Into<String>, value: DocValue) {
        let key = key.into();
        if self.keys.is_reserved(&key) {
            if let Some(text) = value.as_text() {
                if key.eq_ignore_ascii_case(&self.keys.id_key) {
                    self.id = text;
                } else if key.eq_ignore_ascii_case(&self.keys.label_key) {
                    self.label = text;
                } else {
                    self.partition_key = text;
                }
            }
            return;
        }
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    /// Number of keys including the three reserved ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len() + 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn into_parts(self) -> (SerializerConfig, GraphItemBase, Vec<(String, DocValue)>) {
        let base = GraphItemBase::new(self.id, self.label, self.partition_key);
        (self.keys, base, self.properties)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        map.serialize_entry(&self.keys.id_key, &self.id)?;
        map.serialize_entry(&self.keys.label_key, &self.label)?;
        map.serialize_entry(&self.keys.partition_key_key, &self.partition_key)?;
        for (k, v) in &self.properties {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let keys = SerializerConfig::default();
        assert_eq!(keys.id_key, "id");
        assert_eq!(keys.label_key, "label");
        assert_eq!(keys.partition_key_key, "PartitionKey");
        assert!(keys.is_reserved("ID"));
        assert!(keys.is_reserved("partitionkey"));
        assert!(!keys.is_reserved("Title"));
    }

    #[test]
    fn test_keys_deserialize_with_defaults() {
        let keys: SerializerConfig = serde_json::from_str(r#"{"partition_key_key": "pk"}"#).unwrap();
        assert_eq!(keys, SerializerConfig::with_partition_key("pk"));
    }

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut doc = Document::new(SerializerConfig::default(), "1".into(), "L".into(), "p".into());
        doc.insert("b", DocValue::Int(1));
        doc.insert("a", DocValue::Int(2));
        doc.insert("b", DocValue::Int(3));

        let keys: Vec<_> = doc.properties().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(doc.get("b"), Some(DocValue::Int(3)));
        assert_eq!(doc.get("id"), Some(DocValue::from("1")));
        assert_eq!(doc.len(), 5);
    }

    #[test]
    fn test_serialized_key_order() {
        let mut doc = Document::new(SerializerConfig::with_partition_key("pk"), "1".into(), "L".into(), "p".into());
        doc.insert("Title", DocValue::from("Avatar"));

        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(text, r#"{"id":"1","label":"L","pk":"p","Title":"Avatar"}"#);
    }

    #[test]
    fn test_insert_reserved_key_updates_slot() {
        let mut doc = Document::new(SerializerConfig::default(), "1".into(), "L".into(), "p".into());
        doc.insert("id", DocValue::from("2"));
        doc.insert("Label", DocValue::from("Other"));
        doc.insert("PARTITIONKEY", DocValue::Int(9));
        doc.insert("id", DocValue::Null);

        assert_eq!(doc.id(), "2");
        assert_eq!(doc.label(), "Other");
        assert_eq!(doc.partition_key(), "9");
        assert_eq!(doc.properties().count(), 0);

        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(text, r#"{"id":"2","label":"Other","PartitionKey":"9"}"#);
    }
}
