//! # cosmap Core
//!
//! Mapping engine between typed entities and the wire shapes of a
//! document/graph database.
//!
//! This crate provides:
//!
//! - [`Entity`] / [`FieldDef`] - static field registration (id, label, partition key markers)
//! - [`DescriptorRegistry`] - per-type descriptor cache
//! - [`EntitySerializer`] - document projection, vertex and edge encoding, graphson decoding
//! - [`DocValue`] - tagged field value
//!
//! ## Example
//!
//! ```rust
//! use cosmap_core::{DocValue, Entity, EntitySerializer, FieldDef, FieldKind};
//!
//! struct Movie {
//!     tmdb_id: i64,
//!     title: String,
//! }
//!
//! impl Entity for Movie {
//!     fn type_name() -> &'static str {
//!         "MovieFull"
//!     }
//!
//!     fn fields() -> Vec<FieldDef<Self>> {
//!         vec![
//!             FieldDef::<Self>::new("TmdbId", FieldKind::Int, |m| DocValue::from(m.tmdb_id)).id(),
//!             FieldDef::<Self>::new("Title", FieldKind::Text, |m| DocValue::from(&m.title)).partition_key(),
//!         ]
//!     }
//! }
//!
//! let serializer = EntitySerializer::default();
//! let movie = Movie { tmdb_id: 19995, title: "Avatar".to_string() };
//!
//! let document = serializer.to_document(&movie).unwrap();
//! assert_eq!(document.id(), "19995");
//! assert_eq!(document.label(), "MovieFull");
//! assert_eq!(document.partition_key(), "Avatar");
//!
//! let vertex = serializer.to_vertex(&movie).unwrap();
//! assert_eq!(vertex.to_json()["Title"][0]["_value"], "Avatar");
//! ```

pub mod error;
pub mod value;
pub mod entity;
pub mod descriptor;
pub mod document;
pub mod serializer;
pub mod vertex;
pub mod edge;
pub mod graphson;

pub use error::{Error, Result};
pub use value::DocValue;
pub use entity::{Entity, FieldDef, FieldGetter, FieldKind, FieldSetter, Markers};
pub use descriptor::{global_registry, DescriptorRegistry, EntityDescriptor};
pub use document::{Document, GraphItemBase, SerializerConfig};
pub use serializer::{sanitize_value, EntitySerializer, FieldSelectors, ProjectOptions, Selector};
pub use vertex::{VertexDocument, VertexProperty};
pub use edge::{is_edge_key, single_edge_id, EdgeDocument};
pub use graphson::{coerce, GraphsonShape};
