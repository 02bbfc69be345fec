//! Property access capability for host entities.
//!
//! The extensions never introspect objects. Every entity type exposes its
//! properties through [`PropertyAccess`] (hand-written or generated accessor
//! tables) and a stable identity through [`Entity::object_id`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::mapping::EntityMapping;
use crate::value::Value;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an in-memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an identity allocated elsewhere.
    pub fn from_raw(raw: u64) -> Self {
        ObjectId(raw)
    }

    /// Raw identity value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read and write named properties of an object.
pub trait PropertyAccess {
    /// Read the current value of a property.
    fn get_property(&self, property: &str) -> Result<Value>;

    /// Overwrite the value of a property.
    fn set_property(&mut self, property: &str, value: Value) -> Result<()>;
}

/// An object managed by the host ORM.
pub trait Entity: PropertyAccess + Send + Sync {
    /// Name of the mapped class.
    fn class_name(&self) -> &str;

    /// Identity of this object instance.
    fn object_id(&self) -> ObjectId;
}

/// Shared handle to a managed object, mirroring the reference semantics of
/// ORM entities.
pub type EntityHandle = Arc<RwLock<dyn Entity>>;

/// Wrap an entity into a shared handle.
pub fn entity_handle<E: Entity + 'static>(entity: E) -> EntityHandle {
    Arc::new(RwLock::new(entity))
}

/// Check if two handles point at the same object. Takes no lock.
pub fn same_entity(a: &EntityHandle, b: &EntityHandle) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

/// A dynamic entity storing its properties in a map.
///
/// Only properties declared at construction can be read or written. A clone
/// is a new object: it copies the values and gets a fresh [`ObjectId`].
#[derive(Debug, PartialEq)]
pub struct Record {
    id: ObjectId,
    class_name: String,
    properties: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record declaring the given properties, all null.
    pub fn new<I, S>(class_name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: ObjectId::next(),
            class_name: class_name.into(),
            properties: properties
                .into_iter()
                .map(|name| (name.into(), Value::Null))
                .collect(),
        }
    }

    /// Create a record for a mapped class: every declared property is null,
    /// collection-valued associations start as empty collections.
    pub fn from_mapping(mapping: &EntityMapping) -> Self {
        let properties = mapping
            .properties
            .iter()
            .map(|decl| {
                let initial = if mapping.is_collection_association(&decl.name) {
                    Value::empty_collection()
                } else {
                    Value::Null
                };
                (decl.name.clone(), initial)
            })
            .collect();

        Self {
            id: ObjectId::next(),
            class_name: mapping.name.clone(),
            properties,
        }
    }

    /// Set a declared property, builder style.
    ///
    /// Undeclared properties are ignored.
    pub fn with_value(mut self, property: &str, value: impl Into<Value>) -> Self {
        if let Some(slot) = self.properties.get_mut(property) {
            *slot = value.into();
        }
        self
    }

    /// Names of the declared properties.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

impl Clone for Record {
    fn clone(&self) -> Self {
        Self {
            id: ObjectId::next(),
            class_name: self.class_name.clone(),
            properties: self.properties.clone(),
        }
    }
}

impl PropertyAccess for Record {
    fn get_property(&self, property: &str) -> Result<Value> {
        self.properties
            .get(property)
            .cloned()
            .ok_or_else(|| Error::property_access(&self.class_name, property))
    }

    fn set_property(&mut self, property: &str, value: Value) -> Result<()> {
        match self.properties.get_mut(property) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::property_access(&self.class_name, property)),
        }
    }
}

impl Entity for Record {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn object_id(&self) -> ObjectId {
        self.id
    }
}
