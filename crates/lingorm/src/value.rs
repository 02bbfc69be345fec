//! Runtime property values.

use std::fmt;
use std::sync::Arc;

use crate::access::{same_entity, EntityHandle, ObjectId};

/// A property value read from or written to an entity, or bound to a query
/// parameter.
///
/// Comparison is structural per kind: collections compare by contents, entity
/// references by identity. There is no coercion between kinds, so
/// `Int(1) != Float(1.0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Reference to another managed object.
    Entity(EntityRef),
    /// Ordered collection of values (collection-valued properties, lists of
    /// candidate values in predicates).
    Collection(Vec<Value>),
}

impl Value {
    /// An empty collection.
    pub fn empty_collection() -> Self {
        Value::Collection(Vec::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or a zero-length collection.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Collection(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Check if this value is a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Collection(_))
    }

    /// Check if this value references an entity.
    pub fn is_entity(&self) -> bool {
        matches!(self, Value::Entity(_))
    }

    /// Scalars are everything but null, entity references and collections.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Value::Null | Value::Entity(_) | Value::Collection(_)
        )
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as entity reference.
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Try to get the items of a collection.
    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Value::Collection(items) => Some(items),
            _ => None,
        }
    }
}

/// Identity-compared reference to a managed object.
#[derive(Clone)]
pub struct EntityRef {
    id: ObjectId,
    class_name: Arc<str>,
    handle: EntityHandle,
}

impl EntityRef {
    /// Reference the object behind a handle.
    ///
    /// Briefly takes a read lock to capture class name and identity.
    pub fn new(handle: EntityHandle) -> Self {
        let (id, class_name) = {
            let entity = handle.read();
            (entity.object_id(), Arc::<str>::from(entity.class_name()))
        };
        Self {
            id,
            class_name,
            handle,
        }
    }

    /// Identity of the referenced object.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Class of the referenced object.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Shared handle to the referenced object.
    pub fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    /// Check whether this reference points at the object behind `handle`.
    pub fn refers_to(&self, handle: &EntityHandle) -> bool {
        same_entity(&self.handle, handle)
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("class", &self.class_name)
            .field("id", &self.id)
            .finish()
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<EntityRef> for Value {
    fn from(v: EntityRef) -> Self {
        Value::Entity(v)
    }
}

impl From<EntityHandle> for Value {
    fn from(v: EntityHandle) -> Self {
        Value::Entity(EntityRef::new(v))
    }
}

impl From<&EntityHandle> for Value {
    fn from(v: &EntityHandle) -> Self {
        Value::Entity(EntityRef::new(v.clone()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Collection(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
