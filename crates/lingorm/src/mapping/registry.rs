//! Registry of entity mappings.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

use super::base::{BaseClassMetadata, BaseMetadataFactory};
use super::entity::EntityMapping;

/// Registered entity mappings, keyed by class name.
///
/// Serves as the host metadata factory when no ORM is plugged in. Classes
/// without a mapping are transient.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    entities: RwLock<HashMap<String, Arc<EntityMapping>>>,
}

impl MappingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping, replacing an earlier one for the same class.
    pub fn register(&self, mapping: EntityMapping) -> Arc<EntityMapping> {
        let mapping = Arc::new(mapping);
        debug!(class = %mapping.name, "registering entity mapping");
        self.entities
            .write()
            .insert(mapping.name.clone(), mapping.clone());
        mapping
    }

    /// Register several mappings, builder style.
    pub fn with(self, mapping: EntityMapping) -> Self {
        self.register(mapping);
        self
    }

    /// Get a mapping by class name.
    pub fn get(&self, class_name: &str) -> Option<Arc<EntityMapping>> {
        self.entities.read().get(class_name).cloned()
    }

    /// Get a mapping by class name, failing for unmapped classes.
    pub fn entity(&self, class_name: &str) -> Result<Arc<EntityMapping>> {
        self.get(class_name)
            .ok_or_else(|| Error::UnknownClass(class_name.to_string()))
    }

    /// Names of all registered classes, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl BaseMetadataFactory for MappingRegistry {
    fn is_transient(&self, class_name: &str) -> bool {
        !self.entities.read().contains_key(class_name)
    }

    fn metadata_for(&self, class_name: &str) -> Result<Arc<dyn BaseClassMetadata>> {
        let mapping: Arc<dyn BaseClassMetadata> = self.entity(class_name)?;
        Ok(mapping)
    }
}
