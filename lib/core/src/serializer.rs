//! Document projection.
//!
//! [`EntitySerializer`] owns the reserved key names and a handle to the
//! descriptor registry. The vertex, edge and graphson modules extend it with
//! their own entry points.

use crate::descriptor::{global_registry, DescriptorRegistry, EntityDescriptor};
use crate::document::{Document, GraphItemBase, SerializerConfig};
use crate::entity::Entity;
use crate::value::DocValue;
use crate::{Error, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Knobs for a single projection call.
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    /// Copy every non-ignored field, not just id/label/partition key.
    pub expand_all: bool,
    /// Use `""` instead of failing when the partition key is missing.
    pub allow_empty_partition_key: bool,
    /// Id used when the entity has none; a UUID is generated otherwise.
    pub default_id: Option<String>,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            expand_all: true,
            allow_empty_partition_key: false,
            default_id: None,
        }
    }
}

/// Reads one reserved value straight off an entity.
pub type Selector<T> = fn(&T) -> Option<String>;

/// Explicit id/label/partition key accessors for types that carry no
/// markers.
pub struct FieldSelectors<T> {
    pub partition_key: Option<Selector<T>>,
    pub label: Option<Selector<T>>,
    pub id: Option<Selector<T>>,
}

impl<T> FieldSelectors<T> {
    #[must_use]
    pub fn new(partition_key: Selector<T>) -> Self {
        Self {
            partition_key: Some(partition_key),
            label: None,
            id: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: Selector<T>) -> Self {
        self.label = Some(label);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: Selector<T>) -> Self {
        self.id = Some(id);
        self
    }
}

impl<T> Default for FieldSelectors<T> {
    fn default() -> Self {
        Self {
            partition_key: None,
            label: None,
            id: None,
        }
    }
}

/// Maps entities to documents, vertices and edges and back.
#[derive(Debug, Clone)]
pub struct EntitySerializer {
    config: SerializerConfig,
    registry: Arc<DescriptorRegistry>,
}

impl Default for EntitySerializer {
    fn default() -> Self {
        Self::new(SerializerConfig::default())
    }
}

impl EntitySerializer {
    /// Serializer backed by the process-wide descriptor registry.
    pub fn new(config: SerializerConfig) -> Self {
        Self::with_registry(config, global_registry())
    }

    pub fn with_registry(config: SerializerConfig, registry: Arc<DescriptorRegistry>) -> Self {
        Self { config, registry }
    }

    /// Default keys with a custom partition key property name.
    pub fn with_partition_key(partition_key_key: impl Into<String>) -> Self {
        Self::new(SerializerConfig::with_partition_key(partition_key_key))
    }

    #[inline]
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    pub fn descriptor<T: Entity>(&self) -> Result<Arc<EntityDescriptor<T>>> {
        self.registry.resolve::<T>()
    }

    /// Project with default options: every field expanded, partition key
    /// required, id generated when missing.
    pub fn to_document<T: Entity>(&self, entity: &T) -> Result<Document> {
        self.project(entity, &ProjectOptions::default())
    }

    pub fn project<T: Entity>(&self, entity: &T, options: &ProjectOptions) -> Result<Document> {
        let descriptor = self.descriptor::<T>()?;

        let label = descriptor
            .label_field()
            .and_then(|f| f.value(entity).as_text())
            .unwrap_or_else(|| descriptor.type_name().to_string());

        let id = descriptor
            .id_field()
            .and_then(|f| sanitize_value(f.value(entity).as_text()))
            .or_else(|| options.default_id.clone())
            .unwrap_or_else(new_id);

        let partition_key = match descriptor.pk_field().and_then(|f| sanitize_value(f.value(entity).as_text())) {
            Some(pk) => pk,
            None if options.allow_empty_partition_key => String::new(),
            None => {
                return Err(Error::MissingPartitionKey {
                    type_name: descriptor.type_name(),
                })
            }
        };

        let mut document = Document::new(self.config.clone(), id, label, partition_key);
        if options.expand_all {
            self.expand_fields(&descriptor, entity, &mut document);
        }
        Ok(document)
    }

    /// Project a type that carries no markers, reading the reserved values
    /// through explicit selectors.
    pub fn project_with<T: Entity>(&self, entity: &T, selectors: &FieldSelectors<T>) -> Result<Document> {
        let descriptor = self.descriptor::<T>()?;

        let partition_key = selectors
            .partition_key
            .and_then(|select| sanitize_value(select(entity)))
            .ok_or(Error::MissingPartitionKey {
                type_name: descriptor.type_name(),
            })?;

        let label = selectors
            .label
            .and_then(|select| select(entity))
            .unwrap_or_else(|| descriptor.type_name().to_string());

        let id = selectors
            .id
            .and_then(|select| sanitize_value(select(entity)))
            .unwrap_or_else(new_id);

        let mut document = Document::new(self.config.clone(), id, label, partition_key);
        self.expand_fields(&descriptor, entity, &mut document);
        Ok(document)
    }

    /// Identity triple of an entity; the partition key is required.
    pub fn to_graph_item_base<T: Entity>(&self, entity: &T) -> Result<GraphItemBase> {
        let options = ProjectOptions {
            expand_all: false,
            ..ProjectOptions::default()
        };
        Ok(self.project(entity, &options)?.graph_item_base())
    }

    fn expand_fields<T>(&self, descriptor: &EntityDescriptor<T>, entity: &T, document: &mut Document) {
        for field in descriptor.fields() {
            if descriptor.is_ignored(field.name) || self.config.is_reserved(field.name) {
                continue;
            }
            let value = match field.value(entity) {
                DocValue::Null => DocValue::Text(String::new()),
                value => value,
            };
            document.insert(field.name, value);
        }
    }
}

/// Normalize a raw id or partition key value; blank values count as absent.
pub fn sanitize_value(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FieldDef, FieldKind};

    #[derive(Default)]
    struct Movie {
        tmdb_id: i64,
        title: String,
        tagline: Option<String>,
        internal_note: String,
    }

    impl Entity for Movie {
        fn type_name() -> &'static str {
            "MovieFull"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("TmdbId", FieldKind::Int, |m| DocValue::from(m.tmdb_id)).id(),
                FieldDef::<Self>::new("Title", FieldKind::Text, |m| DocValue::from(&m.title)).partition_key(),
                FieldDef::<Self>::new("Tagline", FieldKind::Text, |m| DocValue::from(m.tagline.clone())),
                FieldDef::<Self>::new("InternalNote", FieldKind::Text, |m| DocValue::from(&m.internal_note)).ignored(),
            ]
        }
    }

    /// No markers at all.
    #[derive(Default)]
    struct Note {
        key: String,
        owner: String,
        body: String,
    }

    impl Entity for Note {
        fn type_name() -> &'static str {
            "Note"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("Key", FieldKind::Text, |n| DocValue::from(&n.key)),
                FieldDef::<Self>::new("Owner", FieldKind::Text, |n| DocValue::from(&n.owner)),
                FieldDef::<Self>::new("Body", FieldKind::Text, |n| DocValue::from(&n.body)),
            ]
        }
    }

    fn serializer() -> EntitySerializer {
        EntitySerializer::with_registry(SerializerConfig::default(), Arc::new(DescriptorRegistry::new()))
    }

    fn avatar() -> Movie {
        Movie {
            tmdb_id: 19995,
            title: "Avatar".into(),
            tagline: None,
            internal_note: "hidden".into(),
        }
    }

    #[test]
    fn test_project_with_markers() {
        let doc = serializer().to_document(&avatar()).unwrap();

        assert_eq!(doc.id(), "19995");
        assert_eq!(doc.label(), "MovieFull");
        assert_eq!(doc.partition_key(), "Avatar");
        assert_eq!(doc.get("Title"), Some(DocValue::from("Avatar")));
        assert_eq!(doc.get("TmdbId"), Some(DocValue::Int(19995)));
        // null becomes an empty placeholder
        assert_eq!(doc.get("Tagline"), Some(DocValue::from("")));
        assert_eq!(doc.get("InternalNote"), None);
    }

    #[test]
    fn test_project_without_expansion() {
        let options = ProjectOptions {
            expand_all: false,
            ..ProjectOptions::default()
        };
        let doc = serializer().project(&avatar(), &options).unwrap();
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_missing_partition_key() {
        let s = serializer();
        let mut movie = avatar();
        movie.title = "   ".into();

        assert!(matches!(
            s.to_document(&movie),
            Err(Error::MissingPartitionKey { type_name: "MovieFull" })
        ));

        let options = ProjectOptions {
            allow_empty_partition_key: true,
            ..ProjectOptions::default()
        };
        assert_eq!(s.project(&movie, &options).unwrap().partition_key(), "");
    }

    #[test]
    fn test_selectors() {
        let s = serializer();
        let note = Note {
            key: "n-1".into(),
            owner: "ana".into(),
            body: "hello".into(),
        };

        let selectors = FieldSelectors::<Note>::new(|n| Some(n.owner.clone())).with_id(|n| Some(n.key.clone()));
        let doc = s.project_with(&note, &selectors).unwrap();
        assert_eq!(doc.id(), "n-1");
        assert_eq!(doc.label(), "Note");
        assert_eq!(doc.partition_key(), "ana");
        assert_eq!(doc.get("Body"), Some(DocValue::from("hello")));

        let no_pk = FieldSelectors::<Note>::default();
        assert!(matches!(
            s.project_with(&note, &no_pk),
            Err(Error::MissingPartitionKey { .. })
        ));

        let without_id = FieldSelectors::<Note>::new(|n| Some(n.owner.clone()));
        let a = s.project_with(&note, &without_id).unwrap();
        let b = s.project_with(&note, &without_id).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_graph_item_base() {
        let base = serializer().to_graph_item_base(&avatar()).unwrap();
        assert_eq!(base, GraphItemBase::new("19995", "MovieFull", "Avatar"));
    }

    #[test]
    fn test_sanitize_value() {
        assert_eq!(sanitize_value(None), None);
        assert_eq!(sanitize_value(Some(String::new())), None);
        assert_eq!(sanitize_value(Some(" \t".into())), None);
        assert_eq!(sanitize_value(Some(" a b ".into())), Some("a b".into()));
        assert_eq!(sanitize_value(Some("id".into())), Some("id".into()));
    }
}
