//! Change tracking of individual object properties.
//!
//! The observer keeps a baseline value per (object, property) and tells
//! whether the current value still equals it. Entries are keyed by
//! [`ObjectId`] and never keep the objects alive; whoever owns the observer
//! (typically one unit of work) calls [`PropertyObserver::remove`] when an
//! object is detached and [`PropertyObserver::clear`] when the unit of work
//! ends.

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::trace;

use crate::access::{Entity, ObjectId, PropertyAccess};
use crate::error::{Error, Result};
use crate::value::Value;

/// Ledger of last-known property values.
#[derive(Debug, Default)]
pub struct PropertyObserver {
    saved: DashMap<ObjectId, HashMap<String, Value>>,
}

impl PropertyObserver {
    /// Create an empty observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current value of `property` and store it as the baseline.
    pub fn save_value(&self, object: &dyn Entity, property: &str) -> Result<()> {
        let value = object.get_property(property)?;
        self.set_value(object, property, value);
        Ok(())
    }

    /// Store `value` as the baseline of `property` without reading the object.
    pub fn set_value(&self, object: &dyn Entity, property: &str, value: Value) {
        trace!(object = %object.object_id(), property, "saving property baseline");
        self.saved
            .entry(object.object_id())
            .or_default()
            .insert(property.to_string(), value);
    }

    /// Check if a baseline exists for `property`.
    pub fn has_saved_value(&self, object: &dyn Entity, property: &str) -> bool {
        self.saved
            .get(&object.object_id())
            .map(|values| values.contains_key(property))
            .unwrap_or(false)
    }

    /// The baseline of `property`.
    ///
    /// A baseline saved as null is returned as [`Value::Null`]; a missing one
    /// is an error.
    pub fn saved_value(&self, object: &dyn Entity, property: &str) -> Result<Value> {
        self.saved
            .get(&object.object_id())
            .and_then(|values| values.get(property).cloned())
            .ok_or_else(|| Error::UnknownProperty {
                object: object.object_id(),
                property: property.to_string(),
            })
    }

    /// Compare the current value of `property` with its baseline.
    ///
    /// Without a baseline this fails, unless `treat_missing_as_null` is set:
    /// then the property counts as changed when its current value is not
    /// empty.
    pub fn has_changed_value(
        &self,
        object: &dyn Entity,
        property: &str,
        treat_missing_as_null: bool,
    ) -> Result<bool> {
        let current = object.get_property(property)?;

        match self.saved_value(object, property) {
            Ok(saved) => Ok(saved != current),
            Err(Error::UnknownProperty { .. }) if treat_missing_as_null => Ok(!current.is_empty()),
            Err(e) => Err(e),
        }
    }

    /// Forget every baseline of `object`.
    pub fn remove(&self, object: &dyn Entity) {
        self.remove_object_id(object.object_id());
    }

    /// Forget every baseline of the object with identity `id`.
    pub fn remove_object_id(&self, id: ObjectId) {
        self.saved.remove(&id);
    }

    /// Forget everything.
    pub fn clear(&self) {
        self.saved.clear();
    }

    /// Number of objects with at least one baseline.
    pub fn tracked_objects(&self) -> usize {
        self.saved.len()
    }
}
