//! Persistence collaborators of the translation helper.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::access::{entity_handle, same_entity, Entity, EntityHandle, PropertyAccess, Record};
use crate::error::{Error, Result};
use crate::mapping::{BaseClassMetadata, MappingRegistry, TranslatableDriver};
use crate::metadata::MetadataFactory;
use crate::value::{EntityRef, Value};

/// Tracks which objects are scheduled for persistence.
pub trait ObjectManager: Send + Sync {
    /// Check if the object is managed.
    fn contains(&self, object: &EntityHandle) -> bool;

    /// Schedule the object for insertion.
    fn persist(&self, object: EntityHandle) -> Result<()>;

    /// Schedule the object for removal.
    fn remove(&self, object: &EntityHandle) -> Result<()>;
}

/// Access to the translation rows of translatable objects.
pub trait TranslationRepository: Send + Sync {
    /// The translation of `object` in `locale`, created and attached to the
    /// object's `association` collection when missing.
    fn get_translation(
        &self,
        object: &mut dyn Entity,
        locale: &str,
        association: &str,
    ) -> Result<EntityHandle>;

    /// The translation of `object` in `locale`, if it exists.
    fn find_translation(
        &self,
        object: &dyn Entity,
        locale: &str,
        association: &str,
    ) -> Result<Option<EntityHandle>>;

    /// All translations of `object` held by `association`.
    fn get_translations(&self, object: &dyn Entity, association: &str) -> Result<Vec<EntityRef>> {
        translations_of(object, association)
    }

    /// Drop `translation` from the translations of `object` held by
    /// `association`. Returns whether it was held.
    fn detach_translation(
        &self,
        object: &mut dyn Entity,
        association: &str,
        translation: &EntityHandle,
    ) -> Result<bool> {
        let translations = self.get_translations(object, association)?;
        let held = translations.len();
        let remaining: Vec<Value> = translations
            .into_iter()
            .filter(|item| !item.refers_to(translation))
            .map(Value::Entity)
            .collect();
        if remaining.len() == held {
            return Ok(false);
        }

        object.set_property(association, Value::Collection(remaining))?;
        Ok(true)
    }
}

/// Entity references held by a collection-valued property.
pub(crate) fn translations_of(object: &dyn Entity, association: &str) -> Result<Vec<EntityRef>> {
    match object.get_property(association)? {
        Value::Null => Ok(Vec::new()),
        Value::Collection(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Entity(entity) => Some(entity),
                _ => None,
            })
            .collect()),
        _ => Err(Error::UnexpectedValue {
            class: object.class_name().to_string(),
            property: association.to_string(),
            expected: "a collection of translations",
        }),
    }
}

/// Translation repository over in-memory object graphs.
///
/// Translations are looked up in the object's association collection by
/// their locale property; new ones are [`Record`]s of the association's
/// target class.
pub struct InMemoryTranslationRepository {
    registry: Arc<MappingRegistry>,
    metadata: Arc<MetadataFactory<TranslatableDriver>>,
}

impl InMemoryTranslationRepository {
    /// Create a repository reading mappings from `registry`.
    pub fn new(
        registry: Arc<MappingRegistry>,
        metadata: Arc<MetadataFactory<TranslatableDriver>>,
    ) -> Self {
        Self { registry, metadata }
    }

    /// Translation class and its locale property.
    fn translation_class(&self, object: &dyn Entity, association: &str) -> Result<(String, String)> {
        let mapping = self.registry.entity(object.class_name())?;
        let target = mapping.association_target_class(association).ok_or_else(|| {
            Error::InvalidMetadata(format!(
                "class \"{}\" has no association \"{}\"",
                object.class_name(),
                association
            ))
        })?;

        let locale_property = self
            .metadata
            .get_class_metadata(target)?
            .locale_property()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::InvalidMetadata(format!(
                    "translation class \"{target}\" has no locale property"
                ))
            })?;

        Ok((target.to_string(), locale_property))
    }
}

impl TranslationRepository for InMemoryTranslationRepository {
    fn get_translation(
        &self,
        object: &mut dyn Entity,
        locale: &str,
        association: &str,
    ) -> Result<EntityHandle> {
        if let Some(existing) = self.find_translation(object, locale, association)? {
            return Ok(existing);
        }

        let (class_name, locale_property) = self.translation_class(object, association)?;
        let mapping = self.registry.entity(&class_name)?;
        let mut record = Record::from_mapping(&mapping);
        record.set_property(&locale_property, Value::from(locale))?;
        let translation = entity_handle(record);

        let mut translations = match object.get_property(association)? {
            Value::Collection(items) => items,
            _ => Vec::new(),
        };
        translations.push(Value::from(&translation));
        object.set_property(association, Value::Collection(translations))?;

        debug!(
            class = %class_name,
            object = %object.object_id(),
            locale,
            "created translation"
        );
        Ok(translation)
    }

    fn find_translation(
        &self,
        object: &dyn Entity,
        locale: &str,
        association: &str,
    ) -> Result<Option<EntityHandle>> {
        let (_, locale_property) = self.translation_class(object, association)?;

        for translation in translations_of(object, association)? {
            let matches = translation
                .handle()
                .read()
                .get_property(&locale_property)?
                .as_str()
                == Some(locale);
            if matches {
                return Ok(Some(translation.handle().clone()));
            }
        }

        Ok(None)
    }
}

/// Object manager recording persisted and removed objects.
#[derive(Default)]
pub struct UnitOfWork {
    managed: Mutex<Vec<EntityHandle>>,
    removed: Mutex<Vec<EntityHandle>>,
}

impl UnitOfWork {
    /// Create an empty unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start managing an already persisted object.
    pub fn manage(&self, object: &EntityHandle) {
        let mut managed = self.managed.lock();
        if !managed.iter().any(|m| same_entity(m, object)) {
            managed.push(object.clone());
        }
    }

    /// Managed objects.
    pub fn managed(&self) -> Vec<EntityHandle> {
        self.managed.lock().clone()
    }

    /// Objects scheduled for removal.
    pub fn removed(&self) -> Vec<EntityHandle> {
        self.removed.lock().clone()
    }

    /// Check if the object is scheduled for removal.
    pub fn is_removed(&self, object: &EntityHandle) -> bool {
        self.removed.lock().iter().any(|r| same_entity(r, object))
    }
}

impl ObjectManager for UnitOfWork {
    fn contains(&self, object: &EntityHandle) -> bool {
        self.managed.lock().iter().any(|m| same_entity(m, object))
    }

    fn persist(&self, object: EntityHandle) -> Result<()> {
        self.removed.lock().retain(|r| !same_entity(r, &object));
        self.manage(&object);
        Ok(())
    }

    fn remove(&self, object: &EntityHandle) -> Result<()> {
        self.managed.lock().retain(|m| !same_entity(m, object));
        let mut removed = self.removed.lock();
        if !removed.iter().any(|r| same_entity(r, object)) {
            removed.push(object.clone());
        }
        Ok(())
    }
}
