use crate::entity::{Entity, FieldDef};
use crate::{Error, Result};
use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

/// Resolved per-type metadata: which fields supply id, label and partition
/// key, and which are left out of projected documents.
#[derive(Debug)]
pub struct EntityDescriptor<T> {
    type_name: &'static str,
    fields: Vec<FieldDef<T>>,
    id_field: Option<usize>,
    label_field: Option<usize>,
    pk_field: Option<usize>,
    ignored_field_names: AHashSet<&'static str>,
}

impl<T: Entity> EntityDescriptor<T> {
    /// Scan `T::fields()` for role markers.
    pub fn build() -> Result<Self> {
        let type_name = T::type_name();
        let fields = T::fields();

        let id_field = single_marked(type_name, "Id", &fields, |f| f.markers.id)?;
        let label_field = single_marked(type_name, "Label", &fields, |f| f.markers.label)?;
        let pk_field = single_marked(type_name, "PartitionKey", &fields, |f| f.markers.partition_key)?;

        let ignored_field_names = fields
            .iter()
            .filter(|f| f.markers.ignored)
            .map(|f| f.name)
            .collect();

        Ok(Self {
            type_name,
            fields,
            id_field,
            label_field,
            pk_field,
            ignored_field_names,
        })
    }
}

fn single_marked<T>(
    type_name: &'static str,
    marker: &'static str,
    fields: &[FieldDef<T>],
    is_marked: impl Fn(&FieldDef<T>) -> bool,
) -> Result<Option<usize>> {
    let mut found = None;
    for (idx, field) in fields.iter().enumerate() {
        if is_marked(field) {
            if found.is_some() {
                return Err(Error::AmbiguousMetadata { type_name, marker });
            }
            found = Some(idx);
        }
    }
    Ok(found)
}

impl<T> EntityDescriptor<T> {
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDef<T>] {
        &self.fields
    }

    #[inline]
    pub fn id_field(&self) -> Option<&FieldDef<T>> {
        self.id_field.map(|i| &self.fields[i])
    }

    #[inline]
    pub fn label_field(&self) -> Option<&FieldDef<T>> {
        self.label_field.map(|i| &self.fields[i])
    }

    #[inline]
    pub fn pk_field(&self) -> Option<&FieldDef<T>> {
        self.pk_field.map(|i| &self.fields[i])
    }

    #[inline]
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_field_names.contains(name)
    }

    pub fn ignored_field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ignored_field_names.iter().copied()
    }

    /// Field lookup by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDef<T>> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Lazily populated, never evicted cache of descriptors keyed by type.
///
/// Two threads racing on the first resolution of a type both build the
/// descriptor; the first insert wins and the other copy is dropped.
#[derive(Default)]
pub struct DescriptorRegistry {
    descriptors: RwLock<AHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<T: Entity>(&self) -> Result<Arc<EntityDescriptor<T>>> {
        let key = TypeId::of::<T>();

        if let Some(cached) = self.descriptors.read().get(&key).cloned() {
            return downcast(cached);
        }

        let built: Arc<dyn Any + Send + Sync> = Arc::new(EntityDescriptor::<T>::build()?);
        let entry = self
            .descriptors
            .write()
            .entry(key)
            .or_insert(built)
            .clone();
        downcast(entry)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: Entity>(entry: Arc<dyn Any + Send + Sync>) -> Result<Arc<EntityDescriptor<T>>> {
    entry
        .downcast::<EntityDescriptor<T>>()
        .map_err(|_| Error::InvalidConfig(format!("descriptor cache entry for {} has the wrong type", T::type_name())))
}

impl std::fmt::Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("types", &self.len())
            .finish()
    }
}

/// Process-wide registry (initialized on first use)
static GLOBAL_REGISTRY: OnceLock<Arc<DescriptorRegistry>> = OnceLock::new();

/// Get the process-wide descriptor registry
pub fn global_registry() -> Arc<DescriptorRegistry> {
    GLOBAL_REGISTRY
        .get_or_init(|| Arc::new(DescriptorRegistry::new()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldKind;
    use crate::value::DocValue;

    struct Tagged {
        key: String,
        region: String,
        secret: String,
    }

    impl Entity for Tagged {
        fn type_name() -> &'static str {
            "Tagged"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("Key", FieldKind::Text, |t| DocValue::from(&t.key)).id(),
                FieldDef::<Self>::new("Region", FieldKind::Text, |t| DocValue::from(&t.region)).partition_key(),
                FieldDef::<Self>::new("Secret", FieldKind::Text, |t| DocValue::from(&t.secret)).ignored(),
            ]
        }
    }

    struct TwoIds;

    impl Entity for TwoIds {
        fn type_name() -> &'static str {
            "TwoIds"
        }

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::<Self>::new("A", FieldKind::Int, |_| DocValue::Int(1)).id(),
                FieldDef::<Self>::new("B", FieldKind::Int, |_| DocValue::Int(2)).id(),
            ]
        }
    }

    #[test]
    fn test_resolve_markers() {
        let registry = DescriptorRegistry::new();
        let descriptor = registry.resolve::<Tagged>().unwrap();

        assert_eq!(descriptor.type_name(), "Tagged");
        assert_eq!(descriptor.id_field().map(|f| f.name), Some("Key"));
        assert_eq!(descriptor.pk_field().map(|f| f.name), Some("Region"));
        assert!(descriptor.label_field().is_none());
        assert!(descriptor.is_ignored("Secret"));
        assert!(!descriptor.is_ignored("Key"));

        let t = Tagged {
            key: "k".into(),
            region: "r".into(),
            secret: "s".into(),
        };
        assert_eq!(descriptor.field("Secret").unwrap().value(&t), DocValue::from("s"));
    }

    #[test]
    fn test_resolve_is_cached() {
        let registry = DescriptorRegistry::new();
        let first = registry.resolve::<Tagged>().unwrap();
        let second = registry.resolve::<Tagged>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ambiguous_id_fails_every_time() {
        let registry = DescriptorRegistry::new();
        for _ in 0..3 {
            match registry.resolve::<TwoIds>() {
                Err(Error::AmbiguousMetadata { type_name, marker }) => {
                    assert_eq!(type_name, "TwoIds");
                    assert_eq!(marker, "Id");
                }
                other => panic!("expected ambiguous metadata, got {:?}", other.map(|_| ())),
            }
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_resolution() {
        let registry = Arc::new(DescriptorRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.resolve::<Tagged>().map(|d| d.fields().len()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 3);
        }
        assert_eq!(registry.len(), 1);
    }
}
