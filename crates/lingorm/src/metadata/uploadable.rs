//! Uploadable property metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::class::{ClassMetadata, ExtendedMetadata};

const UPLOADABLE: &str = "uploadable";

/// Storage settings of one uploadable property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadableProperty {
    /// Property receiving the stored file key.
    pub target_field: String,
    /// Named filesystem the file is written to.
    pub filesystem: Option<String>,
    /// Named key generator.
    pub keymaker: Option<String>,
    /// Maximum length of generated keys.
    pub key_length: Option<u32>,
    /// Pattern used by the key generator.
    pub key_pattern: Option<String>,
}

impl UploadableProperty {
    /// Settings storing the key in `target_field`, everything else defaulted.
    pub fn new(target_field: impl Into<String>) -> Self {
        Self {
            target_field: target_field.into(),
            filesystem: None,
            keymaker: None,
            key_length: None,
            key_pattern: None,
        }
    }
}

/// Uploadable properties of a class, stored as indexes of a generic
/// [`ClassMetadata`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadableClassMetadata {
    metadata: ClassMetadata,
}

impl UploadableClassMetadata {
    /// Create empty metadata for a class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            metadata: ClassMetadata::new(class_name),
        }
    }

    /// Underlying generic metadata.
    pub fn metadata(&self) -> &ClassMetadata {
        &self.metadata
    }

    /// Mark `property` as uploadable, replacing earlier settings.
    pub fn add_uploadable_property(
        &mut self,
        property: &str,
        settings: UploadableProperty,
    ) -> Result<&mut Self> {
        let value = serde_json::to_value(&settings)
            .map_err(|e| Error::InvalidMetadata(e.to_string()))?;
        self.metadata.add_property_metadata(property, UPLOADABLE, value);
        Ok(self)
    }

    /// Check if the class has any uploadable property.
    pub fn has_uploadable_properties(&self) -> bool {
        self.metadata
            .all_property_metadata()
            .values()
            .any(|values| values.contains_key(UPLOADABLE))
    }

    /// Settings of one uploadable property.
    pub fn uploadable_property(&self, property: &str) -> Option<UploadableProperty> {
        self.metadata
            .property_metadata(property, UPLOADABLE)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// All uploadable properties with their settings.
    pub fn uploadable_properties(&self) -> BTreeMap<String, UploadableProperty> {
        self.metadata
            .all_property_metadata()
            .keys()
            .filter_map(|property| {
                self.uploadable_property(property)
                    .map(|settings| (property.clone(), settings))
            })
            .collect()
    }
}

impl ExtendedMetadata for UploadableClassMetadata {
    fn for_class(class_name: &str) -> Self {
        UploadableClassMetadata::new(class_name)
    }

    fn class_name(&self) -> &str {
        self.metadata.class_name()
    }
}
