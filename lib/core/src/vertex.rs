//! Graph vertex encoding.
//!
//! Gremlin-style stores want every vertex property as a list of
//! `{ id, _value, _meta }` entries, even for single values, and cannot hold
//! nested structures. Complex values are therefore stored as JSON text.

use crate::document::{Document, GraphItemBase, SerializerConfig};
use crate::entity::Entity;
use crate::serializer::{new_id, EntitySerializer, FieldSelectors};
use crate::value::DocValue;
use crate::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// One entry of a multi-valued vertex property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexProperty {
    pub id: String,
    #[serde(rename = "_value")]
    pub value: DocValue,
    #[serde(rename = "_meta")]
    pub meta: Map<String, Value>,
}

impl VertexProperty {
    /// Wrap a value, turning anything the graph cannot carry into JSON text.
    pub fn wrap(value: DocValue) -> Result<Self> {
        let value = if value.is_graph_scalar() {
            value
        } else {
            DocValue::Text(serde_json::to_string(&value)?)
        };
        Ok(Self {
            id: new_id(),
            value,
            meta: Map::new(),
        })
    }
}

/// A vertex ready to be written to a graph container.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexDocument {
    keys: SerializerConfig,
    base: GraphItemBase,
    properties: Vec<(String, Vec<VertexProperty>)>,
}

impl VertexDocument {
    /// Re-wrap a projected document into vertex shape.
    pub fn from_document(document: Document) -> Result<Self> {
        let (keys, base, fields) = document.into_parts();
        let properties = fields
            .into_iter()
            .filter(|(name, _)| !keys.is_reserved(name))
            .map(|(name, value)| Ok((name, vec![VertexProperty::wrap(value)?])))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { keys, base, properties })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.base.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.base.label
    }

    #[inline]
    pub fn partition_key(&self) -> &str {
        &self.base.partition_key
    }

    #[inline]
    pub fn graph_item_base(&self) -> &GraphItemBase {
        &self.base
    }

    pub fn property(&self, name: &str) -> Option<&[VertexProperty]> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(k, _)| k.as_str())
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for VertexDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len() + 3))?;
        map.serialize_entry(&self.keys.id_key, &self.base.id)?;
        map.serialize_entry(&self.keys.label_key, &self.base.label)?;
        map.serialize_entry(&self.keys.partition_key_key, &self.base.partition_key)?;
        for (name, values) in &self.properties {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

impl EntitySerializer {
    /// Vertex from an entity carrying id/label/partition key markers.
    pub fn to_vertex<T: Entity>(&self, entity: &T) -> Result<VertexDocument> {
        VertexDocument::from_document(self.to_document(entity)?)
    }

    /// Vertex from an unmarked entity, using explicit selectors.
    pub fn to_vertex_with<T: Entity>(&self, entity: &T, selectors: &FieldSelectors<T>) -> Result<VertexDocument> {
        VertexDocument::from_document(self.project_with(entity, selectors)?)
    }

    /// Vertex from an already projected document.
    pub fn vertex_from_document(&self, document: Document) -> Result<VertexDocument> {
        VertexDocument::from_document(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorRegistry;
    use crate::entity::{FieldDef, FieldKind};
    use serde_json::json;
    use std::sync::Arc;

    struct Movie {
        title: String,
        year: i32,
        genres: Vec<String>,
    }

    impl Entity for Movie {
        fn type_name() -> &'static str {
            "Movie"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("Title", FieldKind::Text, |m| DocValue::from(&m.title)).partition_key(),
                FieldDef::<Self>::new("Year", FieldKind::Int, |m| DocValue::from(m.year)),
                FieldDef::<Self>::new("Genres", FieldKind::Complex, |m| DocValue::nested(&m.genres)),
            ]
        }
    }

    fn serializer() -> EntitySerializer {
        EntitySerializer::with_registry(SerializerConfig::default(), Arc::new(DescriptorRegistry::new()))
    }

    fn movie() -> Movie {
        Movie {
            title: "Avatar".into(),
            year: 2009,
            genres: vec!["Action".into(), "Adventure".into()],
        }
    }

    #[test]
    fn test_vertex_wire_shape() {
        let vertex = serializer().to_vertex(&movie()).unwrap();
        let json = vertex.to_json();

        assert_eq!(json["label"], json!("Movie"));
        assert_eq!(json["PartitionKey"], json!("Avatar"));
        assert!(json["id"].is_string());

        let title = &json["Title"];
        assert_eq!(title.as_array().unwrap().len(), 1);
        assert_eq!(title[0]["_value"], json!("Avatar"));
        assert_eq!(title[0]["_meta"], json!({}));
        assert!(uuid::Uuid::parse_str(title[0]["id"].as_str().unwrap()).is_ok());

        assert_eq!(json["Year"][0]["_value"], json!(2009));
    }

    #[test]
    fn test_complex_values_become_json_text() {
        let vertex = serializer().to_vertex(&movie()).unwrap();
        let genres = vertex.property("Genres").unwrap();
        assert_eq!(genres[0].value, DocValue::from(r#"["Action","Adventure"]"#));
    }

    #[test]
    fn test_property_ids_are_unique() {
        let vertex = serializer().to_vertex(&movie()).unwrap();
        let title = &vertex.property("Title").unwrap()[0];
        let year = &vertex.property("Year").unwrap()[0];
        assert_ne!(title.id, year.id);
    }

    #[test]
    fn test_custom_partition_key_name() {
        let s = EntitySerializer::with_registry(SerializerConfig::with_partition_key("pk"), Arc::new(DescriptorRegistry::new()));
        let json = s.to_vertex(&movie()).unwrap().to_json();
        assert_eq!(json["pk"], json!("Avatar"));
        assert!(json.get("PartitionKey").is_none());
    }

    struct Track {
        album: String,
        number: i32,
        name: String,
    }

    impl Entity for Track {
        fn type_name() -> &'static str {
            "Track"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("Album", FieldKind::Text, |t| DocValue::from(&t.album)),
                FieldDef::<Self>::new("Number", FieldKind::Int, |t| DocValue::from(t.number)),
                FieldDef::<Self>::new("Name", FieldKind::Text, |t| DocValue::from(&t.name)),
            ]
        }
    }

    #[test]
    fn test_vertex_from_selectors() {
        let selectors = FieldSelectors::<Track>::new(|t| Some(t.album.clone()))
            .with_id(|t| Some(format!("{}-{}", t.album, t.number)))
            .with_label(|_| Some("Song".to_string()));
        let track = Track {
            album: "Kid A".into(),
            number: 1,
            name: "Everything in Its Right Place".into(),
        };

        let vertex = serializer().to_vertex_with(&track, &selectors).unwrap();
        assert_eq!(vertex.id(), "Kid A-1");
        assert_eq!(vertex.label(), "Song");
        assert_eq!(vertex.partition_key(), "Kid A");

        let names: Vec<&str> = vertex.property_names().collect();
        assert_eq!(names, vec!["Album", "Number", "Name"]);
        assert_eq!(vertex.property("Number").unwrap()[0].value, DocValue::Int(1));
    }

    #[test]
    fn test_vertex_from_existing_document() {
        let s = serializer();
        let mut document = s.to_document(&movie()).unwrap();
        document.insert("Rating", DocValue::Float(7.9));

        let vertex = s.vertex_from_document(document.clone()).unwrap();
        assert_eq!(vertex.graph_item_base(), &document.graph_item_base());
        assert_eq!(vertex.property("Rating").unwrap()[0].value, DocValue::Float(7.9));
        assert_eq!(vertex.property("Genres").unwrap()[0].value, DocValue::from(r#"["Action","Adventure"]"#));
    }
}
