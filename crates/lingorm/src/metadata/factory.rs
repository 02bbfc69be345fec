//! Per-class cache of extended metadata.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::mapping::{BaseMetadataFactory, MappingDriver};

/// Loads extended metadata through a driver and keeps it for the lifetime of
/// the factory.
///
/// Two threads asking for the same uncached class may both run the driver;
/// the first stored result wins and both get an equivalent value.
pub struct MetadataFactory<D: MappingDriver> {
    driver: D,
    base: Arc<dyn BaseMetadataFactory>,
    cache: DashMap<String, Arc<D::Metadata>>,
}

impl<D: MappingDriver> MetadataFactory<D> {
    /// Create a factory reading host metadata from `base`.
    pub fn new(driver: D, base: Arc<dyn BaseMetadataFactory>) -> Self {
        Self {
            driver,
            base,
            cache: DashMap::new(),
        }
    }

    /// Extended metadata of a class, loaded on first request.
    #[instrument(skip(self))]
    pub fn get_class_metadata(&self, class_name: &str) -> Result<Arc<D::Metadata>> {
        if let Some(cached) = self.cache.get(class_name) {
            return Ok(cached.clone());
        }

        let loaded = Arc::new(
            self.driver
                .load_class_metadata(self.base.as_ref(), class_name)?,
        );
        debug!(class = class_name, "loaded extended class metadata");

        let entry = self
            .cache
            .entry(class_name.to_string())
            .or_insert(loaded);
        Ok(entry.clone())
    }

    /// Check if the metadata of a class is cached.
    pub fn is_cached(&self, class_name: &str) -> bool {
        self.cache.contains_key(class_name)
    }

    /// Drop all cached metadata.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Host metadata source.
    pub fn base(&self) -> &Arc<dyn BaseMetadataFactory> {
        &self.base
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
