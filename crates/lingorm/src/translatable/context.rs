//! Everything the helper needs to synchronize one translation association.

use std::sync::Arc;

use crate::mapping::BaseClassMetadata;
use crate::metadata::{TranslatableClassMetadata, TranslationAssociationMetadata};

use super::repository::{ObjectManager, TranslationRepository};

/// Metadata and collaborators for one translatable class and one of its
/// translation associations. Built per operation.
pub struct TranslationContext<'a> {
    translatable: Arc<TranslatableClassMetadata>,
    translation: Arc<dyn BaseClassMetadata>,
    association: TranslationAssociationMetadata,
    repository: &'a dyn TranslationRepository,
    object_manager: &'a dyn ObjectManager,
}

impl<'a> TranslationContext<'a> {
    pub fn new(
        translatable: Arc<TranslatableClassMetadata>,
        translation: Arc<dyn BaseClassMetadata>,
        association: TranslationAssociationMetadata,
        repository: &'a dyn TranslationRepository,
        object_manager: &'a dyn ObjectManager,
    ) -> Self {
        Self {
            translatable,
            translation,
            association,
            repository,
            object_manager,
        }
    }

    /// Translatable metadata of the entity class.
    pub fn translatable_metadata(&self) -> &TranslatableClassMetadata {
        &self.translatable
    }

    /// Host metadata of the translation class.
    pub fn translation_metadata(&self) -> &dyn BaseClassMetadata {
        self.translation.as_ref()
    }

    /// Metadata of the synchronized association.
    pub fn association_metadata(&self) -> &TranslationAssociationMetadata {
        &self.association
    }

    pub fn association_name(&self) -> &str {
        self.association.association_name()
    }

    pub fn repository(&self) -> &'a dyn TranslationRepository {
        self.repository
    }

    pub fn object_manager(&self) -> &'a dyn ObjectManager {
        self.object_manager
    }

    /// Check if a translation field holds a collection.
    pub fn is_collection_field(&self, translation_field: &str) -> bool {
        self.translation
            .is_collection_valued_association(translation_field)
    }
}
