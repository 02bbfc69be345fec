//! Translatable entity metadata.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::class::{ClassMetadata, ExtendedMetadata};

const LOCALE_PROPERTY: &str = "translatable.locale_property";
const ASSOCIATION: &str = "translatable.association";
const TARGET_FIELD: &str = "translatable.target_field";

/// Which properties of a class are translatable, which translation
/// association holds each of them and which property holds the locale.
///
/// Stored as indexes of a generic [`ClassMetadata`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslatableClassMetadata {
    metadata: ClassMetadata,
}

impl TranslatableClassMetadata {
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

    /// Set the property holding the object's locale.
    pub fn set_locale_property(&mut self, property: impl Into<String>) -> &mut Self {
        self.metadata
            .add_class_metadata(LOCALE_PROPERTY, property.into());
        self
    }

    /// Property holding the object's locale.
    pub fn locale_property(&self) -> Option<&str> {
        self.metadata
            .class_metadata(LOCALE_PROPERTY)
            .and_then(|value| value.as_str())
    }

    /// Register `property` as translatable through `association`, stored in
    /// `target_field` of the translation row (the property name when `None`).
    ///
    /// A property belongs to exactly one association; re-registering it under
    /// the same association updates the target field.
    pub fn add_translatable_property(
        &mut self,
        association: &str,
        property: &str,
        target_field: Option<&str>,
    ) -> Result<&mut Self> {
        if let Some(existing) = self.association_for(property) {
            if existing != association {
                return Err(Error::InvalidMetadata(format!(
                    "property \"{}\" of class \"{}\" is already translated through association \"{}\"",
                    property,
                    self.metadata.class_name(),
                    existing
                )));
            }
        }

        let target_field = target_field.unwrap_or(property);
        self.metadata
            .add_property_metadata(property, ASSOCIATION, association)
            .add_property_metadata(property, TARGET_FIELD, target_field);
        Ok(self)
    }

    /// Check if any property is translatable.
    pub fn has_translatable_properties(&self) -> bool {
        self.metadata
            .all_property_metadata()
            .values()
            .any(|values| values.contains_key(ASSOCIATION))
    }

    /// Check if `property` is translatable.
    pub fn is_translatable(&self, property: &str) -> bool {
        self.metadata.has_property_metadata(property, ASSOCIATION)
    }

    /// Association translating `property`.
    pub fn association_for(&self, property: &str) -> Option<&str> {
        self.metadata
            .property_metadata(property, ASSOCIATION)
            .and_then(|value| value.as_str())
    }

    /// Translation-row field storing `property`.
    pub fn translation_field(&self, property: &str) -> Option<&str> {
        self.metadata
            .property_metadata(property, TARGET_FIELD)
            .and_then(|value| value.as_str())
    }

    /// Translatable properties grouped by association:
    /// association -> (source property -> translation field).
    pub fn translatable_properties(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut grouped: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for property in self.metadata.all_property_metadata().keys() {
            if let (Some(association), Some(field)) = (
                self.association_for(property),
                self.translation_field(property),
            ) {
                grouped
                    .entry(association.to_string())
                    .or_default()
                    .insert(property.clone(), field.to_string());
            }
        }
        grouped
    }

    /// Metadata of one translation association.
    pub fn translation_association(&self, association: &str) -> Option<TranslationAssociationMetadata> {
        let properties = self.translatable_properties().remove(association)?;
        TranslationAssociationMetadata::new(association, properties).ok()
    }

    /// Metadata of every translation association, ordered by name.
    pub fn translation_associations(&self) -> Vec<TranslationAssociationMetadata> {
        self.translatable_properties()
            .into_iter()
            .filter_map(|(association, properties)| {
                TranslationAssociationMetadata::new(association, properties).ok()
            })
            .collect()
    }
}

impl ExtendedMetadata for TranslatableClassMetadata {
    fn for_class(class_name: &str) -> Self {
        TranslatableClassMetadata::new(class_name)
    }

    fn class_name(&self) -> &str {
        self.metadata.class_name()
    }
}

/// The mapping between an entity's translatable properties and the fields of
/// its translation rows, for one association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationAssociationMetadata {
    association_name: String,
    properties: BTreeMap<String, String>,
}

impl TranslationAssociationMetadata {
    /// Create association metadata from `source property -> translation field`
    /// pairs. Fails when no property is given.
    pub fn new(
        association_name: impl Into<String>,
        properties: BTreeMap<String, String>,
    ) -> Result<Self> {
        let association_name = association_name.into();
        if properties.is_empty() {
            return Err(Error::InvalidMetadata(format!(
                "translation association \"{association_name}\" has no translatable properties"
            )));
        }

        Ok(Self {
            association_name,
            properties,
        })
    }

    /// Name of the association on the translatable entity.
    pub fn association_name(&self) -> &str {
        &self.association_name
    }

    /// Source property -> translation field.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Translation field storing `property`.
    pub fn translation_field(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }
}
