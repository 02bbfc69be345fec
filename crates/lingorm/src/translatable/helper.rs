//! Copying values between translatable objects and their translation rows.

use std::fmt;

use tracing::debug;

use crate::access::{Entity, EntityHandle, PropertyAccess};
use crate::error::{Error, Result};
use crate::observer::PropertyObserver;
use crate::value::Value;

use super::context::TranslationContext;

/// What [`TranslationHelper::sync_translation`] did.
#[derive(Clone)]
pub enum SyncOutcome {
    /// No translatable property changed since the last observation.
    Unchanged,
    /// The values were copied into this translation.
    Copied(EntityHandle),
    /// The object had no translated values; its translation was removed.
    Removed,
    /// The object had no translated values and no translation to remove.
    Skipped,
}

impl fmt::Debug for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Unchanged => f.write_str("Unchanged"),
            SyncOutcome::Copied(translation) => f
                .debug_tuple("Copied")
                .field(&translation.read().object_id())
                .finish(),
            SyncOutcome::Removed => f.write_str("Removed"),
            SyncOutcome::Skipped => f.write_str("Skipped"),
        }
    }
}

/// Translation lifecycle operations on one association of a translatable
/// object.
///
/// The object itself is passed as a plain `&mut dyn Entity` (usually the
/// guard of its handle). Translation rows are reached through their handles
/// and locked one at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranslationHelper;

impl TranslationHelper {
    /// Create a helper. It holds no state.
    pub fn new() -> Self {
        TranslationHelper
    }

    /// Current value of the object's locale property.
    pub fn object_locale(
        &self,
        context: &TranslationContext<'_>,
        object: &dyn Entity,
    ) -> Result<Option<String>> {
        let property = locale_property(context, object)?;
        match object.get_property(property)? {
            Value::Null => Ok(None),
            Value::String(locale) => Ok(Some(locale)),
            _ => Err(Error::UnexpectedValue {
                class: object.class_name().to_string(),
                property: property.to_string(),
                expected: "a locale string",
            }),
        }
    }

    /// Overwrite the object's locale property.
    pub fn set_object_locale(
        &self,
        context: &TranslationContext<'_>,
        object: &mut dyn Entity,
        locale: Option<&str>,
    ) -> Result<()> {
        let property = locale_property(context, object)?.to_string();
        object.set_property(&property, locale.map(Value::from).unwrap_or(Value::Null))
    }

    /// Copy the object's translatable values into its translation in the
    /// object's locale, or in `default_locale` when the object has none.
    ///
    /// The translation is created when missing and persisted when the object
    /// manager does not know it yet.
    pub fn copy_properties_to_translation(
        &self,
        context: &TranslationContext<'_>,
        object: &mut dyn Entity,
        default_locale: &str,
    ) -> Result<EntityHandle> {
        let locale = self
            .object_locale(context, object)?
            .filter(|locale| !locale.is_empty())
            .unwrap_or_else(|| default_locale.to_string());

        let translation = context.repository().get_translation(
            object,
            &locale,
            context.association_name(),
        )?;

        let object_manager = context.object_manager();
        if !object_manager.contains(&translation) {
            object_manager.persist(translation.clone())?;
        }

        {
            let mut target = translation.write();
            for (property, field) in context.association_metadata().properties() {
                let value = collection_or_value(context, field, object.get_property(property)?);
                target.set_property(field, value)?;
            }
        }

        debug!(
            class = %object.class_name(),
            object = %object.object_id(),
            locale = %locale,
            "copied properties to translation"
        );
        Ok(translation)
    }

    /// Copy the values of `translation` into the object and set the object's
    /// locale to `locale`.
    pub fn copy_translation_properties(
        &self,
        context: &TranslationContext<'_>,
        object: &mut dyn Entity,
        translation: &dyn Entity,
        locale: &str,
    ) -> Result<()> {
        for (property, field) in context.association_metadata().properties() {
            let value = collection_or_value(context, field, translation.get_property(field)?);
            object.set_property(property, value)?;
        }

        self.set_object_locale(context, object, Some(locale))
    }

    /// Check if any translatable property of the object holds a value: a
    /// non-empty collection for collection fields, non-null otherwise.
    pub fn has_translated_properties(
        &self,
        context: &TranslationContext<'_>,
        object: &dyn Entity,
    ) -> Result<bool> {
        for (property, field) in context.association_metadata().properties() {
            let value = object.get_property(property)?;
            let translated = if context.is_collection_field(field) {
                !value.is_empty()
            } else {
                !value.is_null()
            };
            if translated {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Remove the object's translation in its locale when the object holds no
    /// translated value. Returns whether a translation was removed.
    pub fn remove_empty_translation(
        &self,
        context: &TranslationContext<'_>,
        object: &mut dyn Entity,
    ) -> Result<bool> {
        if self.has_translated_properties(context, object)? {
            return Ok(false);
        }

        let Some(locale) = self
            .object_locale(context, object)?
            .filter(|locale| !locale.is_empty())
        else {
            return Ok(false);
        };

        let association = context.association_name();
        let Some(translation) = context
            .repository()
            .find_translation(object, &locale, association)?
        else {
            return Ok(false);
        };

        context.object_manager().remove(&translation)?;

        context
            .repository()
            .detach_translation(object, association, &translation)?;

        debug!(
            class = %object.class_name(),
            object = %object.object_id(),
            locale = %locale,
            "removed empty translation"
        );
        Ok(true)
    }

    /// Reset every translatable property (empty collection or null) and the
    /// locale property.
    pub fn clear_translatable_properties(
        &self,
        context: &TranslationContext<'_>,
        object: &mut dyn Entity,
    ) -> Result<()> {
        self.clear_translated_values(context, object)?;
        self.set_object_locale(context, object, None)
    }

    /// Reset the translatable properties of the association, leaving the
    /// locale property alone.
    pub fn clear_translated_values(
        &self,
        context: &TranslationContext<'_>,
        object: &mut dyn Entity,
    ) -> Result<()> {
        for (property, field) in context.association_metadata().properties() {
            let empty = if context.is_collection_field(field) {
                Value::empty_collection()
            } else {
                Value::Null
            };
            object.set_property(property, empty)?;
        }
        Ok(())
    }

    /// Record the current locale and translatable values of the object as
    /// the baseline for change detection.
    pub fn observe(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &dyn Entity,
    ) -> Result<()> {
        self.observe_locale(context, observer, object)?;
        self.observe_values(context, observer, object)
    }

    /// Record the current locale as the baseline.
    pub fn observe_locale(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &dyn Entity,
    ) -> Result<()> {
        observer.save_value(object, locale_property(context, object)?)
    }

    /// Record the translatable values of the association as the baseline.
    pub fn observe_values(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &dyn Entity,
    ) -> Result<()> {
        for property in context.association_metadata().properties().keys() {
            observer.save_value(object, property)?;
        }
        Ok(())
    }

    /// Check if the locale or any translatable value changed since
    /// [`Self::observe`]. Unobserved properties count as changed when they
    /// hold a value.
    pub fn has_changed_translatable_properties(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &dyn Entity,
    ) -> Result<bool> {
        Ok(self.has_changed_locale(context, observer, object)?
            || self.has_changed_values(context, observer, object)?)
    }

    /// Check if the locale changed since it was last observed.
    pub fn has_changed_locale(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &dyn Entity,
    ) -> Result<bool> {
        observer.has_changed_value(object, locale_property(context, object)?, true)
    }

    /// Check if any translatable value of the association changed since it
    /// was last observed.
    pub fn has_changed_values(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &dyn Entity,
    ) -> Result<bool> {
        for property in context.association_metadata().properties().keys() {
            if observer.has_changed_value(object, property, true)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Bring the translation in line with the object before it is flushed:
    /// copy changed values into the translation, or drop the translation when
    /// every value was cleared. The new state becomes the observed baseline.
    ///
    /// Objects with several translation associations share one locale
    /// property; sync them with [`Self::sync_association`] instead.
    pub fn sync_translation(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &mut dyn Entity,
        default_locale: &str,
    ) -> Result<SyncOutcome> {
        let locale_changed = self.has_changed_locale(context, observer, object)?;
        let outcome =
            self.sync_association(context, observer, object, default_locale, locale_changed)?;
        self.observe_locale(context, observer, object)?;
        Ok(outcome)
    }

    /// Sync one association given whether the object's locale changed.
    ///
    /// Only the association's values are re-observed; the caller observes
    /// the locale once every association of the object is synced.
    pub fn sync_association(
        &self,
        context: &TranslationContext<'_>,
        observer: &PropertyObserver,
        object: &mut dyn Entity,
        default_locale: &str,
        locale_changed: bool,
    ) -> Result<SyncOutcome> {
        if !locale_changed && !self.has_changed_values(context, observer, object)? {
            return Ok(SyncOutcome::Unchanged);
        }

        let outcome = if self.has_translated_properties(context, object)? {
            SyncOutcome::Copied(self.copy_properties_to_translation(context, object, default_locale)?)
        } else if self.remove_empty_translation(context, object)? {
            SyncOutcome::Removed
        } else {
            SyncOutcome::Skipped
        };

        self.observe_values(context, observer, object)?;
        Ok(outcome)
    }
}

/// Collection fields never receive null.
fn collection_or_value(context: &TranslationContext<'_>, field: &str, value: Value) -> Value {
    if value.is_null() && context.is_collection_field(field) {
        Value::empty_collection()
    } else {
        value
    }
}

fn locale_property<'c>(context: &'c TranslationContext<'_>, object: &dyn Entity) -> Result<&'c str> {
    context
        .translatable_metadata()
        .locale_property()
        .ok_or_else(|| {
            Error::InvalidMetadata(format!(
                "class \"{}\" has no locale property",
                object.class_name()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{entity_handle, same_entity, Record};
    use crate::mapping::{BaseMetadataFactory, MappingRegistry, TranslatableDriver};
    use crate::metadata::MetadataFactory;
    use crate::test_fixtures::article_registry;
    use crate::translatable::{
        InMemoryTranslationRepository, ObjectManager, TranslationRepository, UnitOfWork,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Delegating repository counting detached translations.
    struct CountingRepository {
        inner: InMemoryTranslationRepository,
        detached: AtomicUsize,
    }

    impl TranslationRepository for CountingRepository {
        fn get_translation(
            &self,
            object: &mut dyn Entity,
            locale: &str,
            association: &str,
        ) -> Result<EntityHandle> {
            self.inner.get_translation(object, locale, association)
        }

        fn find_translation(
            &self,
            object: &dyn Entity,
            locale: &str,
            association: &str,
        ) -> Result<Option<EntityHandle>> {
            self.inner.find_translation(object, locale, association)
        }

        fn detach_translation(
            &self,
            object: &mut dyn Entity,
            association: &str,
            translation: &EntityHandle,
        ) -> Result<bool> {
            self.detached.fetch_add(1, Ordering::SeqCst);
            self.inner.detach_translation(object, association, translation)
        }
    }

    struct Fixture {
        registry: Arc<MappingRegistry>,
        metadata: Arc<MetadataFactory<TranslatableDriver>>,
        repository: InMemoryTranslationRepository,
        uow: UnitOfWork,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = article_registry();
            let metadata = Arc::new(MetadataFactory::new(TranslatableDriver, registry.clone()));
            Self {
                repository: InMemoryTranslationRepository::new(registry.clone(), metadata.clone()),
                registry,
                metadata,
                uow: UnitOfWork::new(),
            }
        }

        fn context(&self) -> TranslationContext<'_> {
            self.context_with(&self.repository)
        }

        fn context_with<'a>(&'a self, repository: &'a dyn TranslationRepository) -> TranslationContext<'a> {
            let translatable = self.metadata.get_class_metadata("Article").unwrap();
            let association = translatable.translation_association("translations").unwrap();
            TranslationContext::new(
                translatable,
                self.registry.metadata_for("ArticleTranslation").unwrap(),
                association,
                repository,
                &self.uow,
            )
        }

        fn article(&self) -> Record {
            Record::from_mapping(&self.registry.entity("Article").unwrap())
        }
    }

    fn comment() -> Value {
        entity_handle(Record::new("Comment", ["content"])).into()
    }

    #[test]
    fn test_copy_properties_to_translation() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let mut article = fixture
            .article()
            .with_value("locale", "pl")
            .with_value("title", "Tytuł")
            .with_value("comments", vec![comment()]);

        let translation = helper
            .copy_properties_to_translation(&context, &mut article, "en")
            .unwrap();

        assert!(fixture.uow.contains(&translation));
        let translation = translation.read();
        assert_eq!(translation.get_property("locale").unwrap(), Value::from("pl"));
        assert_eq!(translation.get_property("title").unwrap(), Value::from("Tytuł"));
        assert_eq!(translation.get_property("contents").unwrap(), Value::Null);
        assert_eq!(
            translation.get_property("comments").unwrap().as_collection().map(|c| c.len()),
            Some(1)
        );
    }

    #[test]
    fn test_copy_uses_default_locale_without_object_locale() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let mut article = fixture
            .article()
            .with_value("locale", "")
            .with_value("title", "Title");

        let translation = helper
            .copy_properties_to_translation(&context, &mut article, "en")
            .unwrap();
        assert_eq!(
            translation.read().get_property("locale").unwrap(),
            Value::from("en")
        );
        assert_eq!(
            translation.read().get_property("comments").unwrap(),
            Value::empty_collection()
        );

        let again = helper
            .copy_properties_to_translation(&context, &mut article, "en")
            .unwrap();
        assert!(same_entity(&translation, &again));
        assert_eq!(fixture.uow.managed().len(), 1);
    }

    #[test]
    fn test_copy_translation_properties() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let translation = Record::from_mapping(&fixture.registry.entity("ArticleTranslation").unwrap())
            .with_value("locale", "de")
            .with_value("title", "Titel")
            .with_value("contents", "Inhalt");
        let mut article = fixture.article().with_value("comments", Value::Null);

        helper
            .copy_translation_properties(&context, &mut article, &translation, "de")
            .unwrap();

        assert_eq!(article.get_property("title").unwrap(), Value::from("Titel"));
        assert_eq!(article.get_property("contents").unwrap(), Value::from("Inhalt"));
        assert_eq!(article.get_property("comments").unwrap(), Value::empty_collection());
        assert_eq!(
            helper.object_locale(&context, &article).unwrap().as_deref(),
            Some("de")
        );
    }

    #[test]
    fn test_has_translated_properties() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();

        let empty = fixture.article().with_value("locale", "en");
        assert!(!helper.has_translated_properties(&context, &empty).unwrap());

        let with_comments = fixture.article().with_value("comments", vec![comment()]);
        assert!(helper.has_translated_properties(&context, &with_comments).unwrap());

        let with_title = fixture.article().with_value("title", "");
        assert!(helper.has_translated_properties(&context, &with_title).unwrap());
    }

    #[test]
    fn test_remove_empty_translation() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let mut article = fixture
            .article()
            .with_value("locale", "en")
            .with_value("title", "Title");
        let translation = helper
            .copy_properties_to_translation(&context, &mut article, "en")
            .unwrap();

        assert!(!helper.remove_empty_translation(&context, &mut article).unwrap());

        article.set_property("title", Value::Null).unwrap();
        assert!(helper.remove_empty_translation(&context, &mut article).unwrap());

        assert!(fixture.uow.is_removed(&translation));
        assert_eq!(article.get_property("translations").unwrap(), Value::empty_collection());
        assert!(!helper.remove_empty_translation(&context, &mut article).unwrap());
    }

    #[test]
    fn test_remove_empty_translation_detaches_through_repository() {
        let fixture = Fixture::new();
        let repository = CountingRepository {
            inner: InMemoryTranslationRepository::new(
                fixture.registry.clone(),
                fixture.metadata.clone(),
            ),
            detached: AtomicUsize::new(0),
        };
        let context = fixture.context_with(&repository);
        let helper = TranslationHelper::new();
        let mut article = fixture
            .article()
            .with_value("locale", "en")
            .with_value("title", "Title");
        helper
            .copy_properties_to_translation(&context, &mut article, "en")
            .unwrap();

        article.set_property("title", Value::Null).unwrap();
        assert!(helper.remove_empty_translation(&context, &mut article).unwrap());

        assert_eq!(repository.detached.load(Ordering::SeqCst), 1);
        assert!(repository
            .get_translations(&article, "translations")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_remove_empty_translation_without_locale() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let mut article = fixture.article();

        assert!(!helper.remove_empty_translation(&context, &mut article).unwrap());
        assert!(fixture.uow.removed().is_empty());
    }

    #[test]
    fn test_clear_translatable_properties() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let mut article = fixture
            .article()
            .with_value("locale", "en")
            .with_value("title", "Title")
            .with_value("comments", vec![comment()]);

        helper
            .clear_translatable_properties(&context, &mut article)
            .unwrap();

        assert_eq!(article.get_property("title").unwrap(), Value::Null);
        assert_eq!(article.get_property("comments").unwrap(), Value::empty_collection());
        assert_eq!(helper.object_locale(&context, &article).unwrap(), None);
    }

    #[test]
    fn test_sync_translation() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let observer = PropertyObserver::new();
        let mut article = fixture
            .article()
            .with_value("locale", "en")
            .with_value("title", "Title");

        let outcome = helper
            .sync_translation(&context, &observer, &mut article, "en")
            .unwrap();
        assert!(matches!(outcome, SyncOutcome::Copied(_)));

        let outcome = helper
            .sync_translation(&context, &observer, &mut article, "en")
            .unwrap();
        assert!(matches!(outcome, SyncOutcome::Unchanged));

        article.set_property("title", Value::Null).unwrap();
        let outcome = helper
            .sync_translation(&context, &observer, &mut article, "en")
            .unwrap();
        assert!(matches!(outcome, SyncOutcome::Removed));
        assert!(!helper
            .has_changed_translatable_properties(&context, &observer, &article)
            .unwrap());
    }

    #[test]
    fn test_unexpected_locale_value() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let helper = TranslationHelper::new();
        let article = fixture.article().with_value("locale", 7);

        assert!(matches!(
            helper.object_locale(&context, &article),
            Err(Error::UnexpectedValue { .. })
        ));
    }
}
