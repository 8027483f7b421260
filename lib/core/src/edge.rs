//! Graph edge encoding.
//!
//! An edge lives in its source vertex's partition and records both endpoints'
//! identity. Its own properties are copied as-is; complex values are not
//! flattened to text the way vertex properties are.

use crate::document::{GraphItemBase, SerializerConfig};
use crate::entity::Entity;
use crate::serializer::{EntitySerializer, ProjectOptions};
use crate::value::DocValue;
use crate::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

pub const IS_EDGE_KEY: &str = "_isEdge";
pub const SOURCE_ID_KEY: &str = "_vertexId";
pub const SOURCE_LABEL_KEY: &str = "_vertexLabel";
pub const SINK_ID_KEY: &str = "_sink";
pub const SINK_LABEL_KEY: &str = "_sinkLabel";
pub const SINK_PARTITION_KEY: &str = "_sinkPartition";

const EDGE_KEYS: [&str; 6] = [
    IS_EDGE_KEY,
    SOURCE_ID_KEY,
    SOURCE_LABEL_KEY,
    SINK_ID_KEY,
    SINK_LABEL_KEY,
    SINK_PARTITION_KEY,
];

/// Whether `name` collides with one of the endpoint keys an edge writes.
pub fn is_edge_key(name: &str) -> bool {
    EDGE_KEYS.iter().any(|key| key.eq_ignore_ascii_case(name))
}

/// Id an edge gets when only one edge of its kind may join `source` and
/// `target`. This is a naming convention; the store does not enforce it.
pub fn single_edge_id(source: &GraphItemBase, target: &GraphItemBase) -> String {
    format!("{}-{}", source.id, target.id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDocument {
    keys: SerializerConfig,
    id: String,
    label: String,
    source: GraphItemBase,
    sink: GraphItemBase,
    properties: Vec<(String, DocValue)>,
}

impl EdgeDocument {
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Always the source vertex's partition key.
    #[inline]
    pub fn partition_key(&self) -> &str {
        &self.source.partition_key
    }

    #[inline]
    pub fn source(&self) -> &GraphItemBase {
        &self.source
    }

    #[inline]
    pub fn sink(&self) -> &GraphItemBase {
        &self.sink
    }

    pub fn property(&self, name: &str) -> Option<&DocValue> {
        self.properties.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for EdgeDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len() + 9))?;
        map.serialize_entry(&self.keys.id_key, &self.id)?;
        map.serialize_entry(&self.keys.label_key, &self.label)?;
        map.serialize_entry(&self.keys.partition_key_key, &self.source.partition_key)?;
        map.serialize_entry(IS_EDGE_KEY, &true)?;
        map.serialize_entry(SOURCE_ID_KEY, &self.source.id)?;
        map.serialize_entry(SOURCE_LABEL_KEY, &self.source.label)?;
        map.serialize_entry(SINK_ID_KEY, &self.sink.id)?;
        map.serialize_entry(SINK_LABEL_KEY, &self.sink.label)?;
        map.serialize_entry(SINK_PARTITION_KEY, &self.sink.partition_key)?;
        for (k, v) in &self.properties {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl EntitySerializer {
    /// Edge between two known vertices.
    ///
    /// With `single`, the id defaults to `"{source.id}-{target.id}"` unless the
    /// edge entity supplies its own.
    ///
    /// Fields named like a reserved or endpoint key are dropped. Complex
    /// field values are written as nested JSON, not as text.
    pub fn to_edge<T: Entity>(
        &self,
        entity: &T,
        source: &GraphItemBase,
        target: &GraphItemBase,
        single: bool,
    ) -> Result<EdgeDocument> {
        let options = ProjectOptions {
            expand_all: true,
            allow_empty_partition_key: true,
            default_id: single.then(|| single_edge_id(source, target)),
        };
        let (keys, base, fields) = self.project(entity, &options)?.into_parts();

        let properties = fields
            .into_iter()
            .filter(|(name, _)| !keys.is_reserved(name) && !is_edge_key(name))
            .collect();

        Ok(EdgeDocument {
            keys,
            id: base.id,
            label: base.label,
            source: source.clone(),
            sink: target.clone(),
            properties,
        })
    }

    /// Edge between two entities; both endpoints must resolve to a full
    /// identity triple.
    pub fn to_edge_between<T: Entity, U: Entity, V: Entity>(
        &self,
        entity: &T,
        source: &U,
        target: &V,
        single: bool,
    ) -> Result<EdgeDocument> {
        let source = self.to_graph_item_base(source)?;
        let target = self.to_graph_item_base(target)?;
        self.to_edge(entity, &source, &target, single)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorRegistry;
    use crate::entity::{FieldDef, FieldKind};
    use crate::Error;
    use serde_json::json;
    use std::sync::Arc;

    struct ActedIn {
        character: String,
        order: i32,
    }

    impl Entity for ActedIn {
        fn type_name() -> &'static str {
            "ActedIn"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("Character", FieldKind::Text, |e| DocValue::from(&e.character)),
                FieldDef::<Self>::new("Order", FieldKind::Int, |e| DocValue::from(e.order)),
            ]
        }
    }

    struct Person {
        name: Option<String>,
    }

    impl Entity for Person {
        fn type_name() -> &'static str {
            "Person"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("Name", FieldKind::Text, |p| DocValue::from(p.name.clone()))
                    .id()
                    .partition_key(),
            ]
        }
    }

    struct Rewire {
        sink: String,
        vertex_id: String,
        weight: i32,
    }

    impl Entity for Rewire {
        fn type_name() -> &'static str {
            "Rewire"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("_sink", FieldKind::Text, |r| DocValue::from(&r.sink)),
                FieldDef::<Self>::new("_VertexId", FieldKind::Text, |r| DocValue::from(&r.vertex_id)),
                FieldDef::<Self>::new("Weight", FieldKind::Int, |r| DocValue::from(r.weight)),
            ]
        }
    }

    fn serializer() -> EntitySerializer {
        EntitySerializer::with_registry(SerializerConfig::default(), Arc::new(DescriptorRegistry::new()))
    }

    fn endpoints() -> (GraphItemBase, GraphItemBase) {
        (
            GraphItemBase::new("sam", "Person", "sam-pk"),
            GraphItemBase::new("avatar", "Movie", "avatar-pk"),
        )
    }

    fn acted() -> ActedIn {
        ActedIn {
            character: "Jake Sully".into(),
            order: 0,
        }
    }

    #[test]
    fn test_edge_wire_shape() {
        let (a, b) = endpoints();
        let edge = serializer().to_edge(&acted(), &a, &b, false).unwrap();
        let json = edge.to_json();

        assert_eq!(json["label"], json!("ActedIn"));
        assert_eq!(json["PartitionKey"], json!("sam-pk"));
        assert_eq!(json["_isEdge"], json!(true));
        assert_eq!(json["_vertexId"], json!("sam"));
        assert_eq!(json["_vertexLabel"], json!("Person"));
        assert_eq!(json["_sink"], json!("avatar"));
        assert_eq!(json["_sinkLabel"], json!("Movie"));
        assert_eq!(json["_sinkPartition"], json!("avatar-pk"));
        // verbatim, not vertex-wrapped
        assert_eq!(json["Character"], json!("Jake Sully"));
        assert_eq!(json["Order"], json!(0));
    }

    #[test]
    fn test_single_edge_id_is_deterministic() {
        let s = serializer();
        let (a, b) = endpoints();
        for order in 0..5 {
            let edge = s
                .to_edge(&ActedIn { character: format!("c{order}"), order }, &a, &b, true)
                .unwrap();
            assert_eq!(edge.id(), "sam-avatar");
        }
    }

    #[test]
    fn test_non_single_edges_get_fresh_ids() {
        let s = serializer();
        let (a, b) = endpoints();
        let first = s.to_edge(&acted(), &a, &b, false).unwrap();
        let second = s.to_edge(&acted(), &a, &b, false).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_edge_between_entities() {
        let s = serializer();
        let sam = Person { name: Some("sam".into()) };
        let zoe = Person { name: Some("zoe".into()) };

        let edge = s.to_edge_between(&acted(), &sam, &zoe, true).unwrap();
        assert_eq!(edge.id(), "sam-zoe");
        assert_eq!(edge.partition_key(), "sam");
        assert_eq!(edge.sink().partition_key, "zoe");

        let nobody = Person { name: None };
        assert!(matches!(
            s.to_edge_between(&acted(), &sam, &nobody, false),
            Err(Error::MissingPartitionKey { type_name: "Person" })
        ));
    }

    #[test]
    fn test_edge_fields_cannot_override_endpoints() {
        let (a, b) = endpoints();
        let rewire = Rewire {
            sink: "elsewhere".into(),
            vertex_id: "someone".into(),
            weight: 3,
        };

        let edge = serializer().to_edge(&rewire, &a, &b, false).unwrap();
        assert!(edge.property("_sink").is_none());
        assert!(edge.property("_VertexId").is_none());
        assert_eq!(edge.property("Weight"), Some(&DocValue::Int(3)));

        let json = edge.to_json();
        assert_eq!(json["_sink"], json!("avatar"));
        assert_eq!(json["_vertexId"], json!("sam"));
        assert!(json.get("_VertexId").is_none());
    }
}
