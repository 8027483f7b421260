//! Static field registration for mapped entities.
//!
//! Entity types describe their fields once through [`Entity::fields`]; the
//! descriptor registry turns that list into an [`EntityDescriptor`] and the
//! mappers read and write values through the registered accessors.

use crate::value::DocValue;
use serde_json::Value;

/// Getter returning the field's current value.
pub type FieldGetter<T> = fn(&T) -> DocValue;

/// Setter receiving an already-coerced JSON value.
pub type FieldSetter<T> = fn(&mut T, Value) -> serde_json::Result<()>;

/// Declared type of a field, used when coercing graphson text back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    DateTime,
    /// Stored by ordinal.
    Enum,
    Bytes,
    /// Anything else; round-trips through JSON text.
    Complex,
}

impl FieldKind {
    /// Kinds that convert straight from their text form.
    #[inline]
    pub fn is_directly_convertible(self) -> bool {
        matches!(
            self,
            FieldKind::Bool | FieldKind::Int | FieldKind::Float | FieldKind::Text | FieldKind::DateTime
        )
    }
}

/// Role markers a field may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Markers {
    pub id: bool,
    pub label: bool,
    pub partition_key: bool,
    pub ignored: bool,
}

/// One registered field of entity type `T`.
pub struct FieldDef<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub markers: Markers,
    pub get: FieldGetter<T>,
    pub set: Option<FieldSetter<T>>,
}

impl<T> FieldDef<T> {
    /// A read-only field.
    #[must_use]
    pub fn new(name: &'static str, kind: FieldKind, get: FieldGetter<T>) -> Self {
        Self {
            name,
            kind,
            markers: Markers::default(),
            get,
            set: None,
        }
    }

    /// A field that can also be populated when decoding.
    #[must_use]
    pub fn settable(
        name: &'static str,
        kind: FieldKind,
        get: FieldGetter<T>,
        set: FieldSetter<T>,
    ) -> Self {
        Self::new(name, kind, get).with_setter(set)
    }

    #[must_use]
    pub fn with_setter(mut self, set: FieldSetter<T>) -> Self {
        self.set = Some(set);
        self
    }

    /// Mark this field as the id source.
    #[must_use]
    pub fn id(mut self) -> Self {
        self.markers.id = true;
        self
    }

    /// Mark this field as the label source.
    #[must_use]
    pub fn label(mut self) -> Self {
        self.markers.label = true;
        self
    }

    /// Mark this field as the partition key source.
    #[must_use]
    pub fn partition_key(mut self) -> Self {
        self.markers.partition_key = true;
        self
    }

    /// Exclude this field from projected documents.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.markers.ignored = true;
        self
    }

    #[inline]
    pub fn value(&self, entity: &T) -> DocValue {
        (self.get)(entity)
    }
}

impl<T> Clone for FieldDef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            kind: self.kind,
            markers: self.markers,
            get: self.get,
            set: self.set,
        }
    }
}

impl<T> std::fmt::Debug for FieldDef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("markers", &self.markers)
            .field("settable", &self.set.is_some())
            .finish()
    }
}

/// A type that can be mapped to documents, vertices and edges.
///
/// ```
/// use cosmap_core::{DocValue, Entity, FieldDef, FieldKind};
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     city: String,
/// }
///
/// impl Entity for Person {
///     fn type_name() -> &'static str {
///         "Person"
///     }
///
///     fn fields() -> Vec<FieldDef<Self>> {
///         vec![
///             FieldDef::<Self>::settable("Name", FieldKind::Text, |p| DocValue::from(&p.name), |p, v| {
///                 p.name = serde_json::from_value(v)?;
///                 Ok(())
///             })
///             .id(),
///             FieldDef::<Self>::settable("City", FieldKind::Text, |p| DocValue::from(&p.city), |p, v| {
///                 p.city = serde_json::from_value(v)?;
///                 Ok(())
///             })
///             .partition_key(),
///         ]
///     }
/// }
/// ```
pub trait Entity: Sized + 'static {
    /// Name used as the label when no field is marked as label.
    fn type_name() -> &'static str;

    fn fields() -> Vec<FieldDef<Self>>;
}
