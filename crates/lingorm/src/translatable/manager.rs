//! Entry point wiring locale settings, metadata and the helper together.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::access::Entity;
use crate::config::TranslatableConfig;
use crate::error::{Error, Result};
use crate::mapping::{BaseMetadataFactory, TranslatableDriver};
use crate::metadata::{MetadataFactory, TranslatableClassMetadata};
use crate::observer::PropertyObserver;
use crate::query::{DqlQueryBuilder, QueryBuilder, TranslatableQueryBuilder};

use super::context::TranslationContext;
use super::helper::{SyncOutcome, TranslationHelper};
use super::repository::{ObjectManager, TranslationRepository};

/// Owns the locale configuration and the translatable metadata of one host
/// ORM instance.
pub struct TranslatableManager {
    config: RwLock<TranslatableConfig>,
    base: Arc<dyn BaseMetadataFactory>,
    metadata: Arc<MetadataFactory<TranslatableDriver>>,
    helper: TranslationHelper,
}

impl TranslatableManager {
    /// Create a manager over the host's base metadata.
    pub fn new(base: Arc<dyn BaseMetadataFactory>, config: TranslatableConfig) -> Self {
        Self {
            config: RwLock::new(config),
            metadata: Arc::new(MetadataFactory::new(TranslatableDriver, base.clone())),
            base,
            helper: TranslationHelper::new(),
        }
    }

    /// Set the current locale.
    pub fn set_locale(&self, locale: Option<String>) {
        debug!(locale = ?locale, "current locale changed");
        self.config.write().locale = locale;
    }

    /// Set the default locale.
    pub fn set_default_locale(&self, locale: Option<String>) {
        debug!(locale = ?locale, "default locale changed");
        self.config.write().default_locale = locale;
    }

    /// Snapshot of the locale settings.
    pub fn config(&self) -> TranslatableConfig {
        self.config.read().clone()
    }

    /// Cache of translatable metadata, shared with repositories and query
    /// builders.
    pub fn metadata_factory(&self) -> &Arc<MetadataFactory<TranslatableDriver>> {
        &self.metadata
    }

    /// Translatable metadata of `class_name`.
    pub fn class_metadata(&self, class_name: &str) -> Result<Arc<TranslatableClassMetadata>> {
        self.metadata.get_class_metadata(class_name)
    }

    /// Helper synchronizing single translation associations.
    pub fn helper(&self) -> &TranslationHelper {
        &self.helper
    }

    /// Context for synchronizing the translation association `association` of
    /// `class_name`.
    pub fn translation_context<'a>(
        &self,
        class_name: &str,
        association: &str,
        repository: &'a dyn TranslationRepository,
        object_manager: &'a dyn ObjectManager,
    ) -> Result<TranslationContext<'a>> {
        let translatable = self.class_metadata(class_name)?;
        let association_metadata = translatable
            .translation_association(association)
            .ok_or_else(|| {
                Error::InvalidMetadata(format!(
                    "class \"{class_name}\" has no translatable properties in association \"{association}\""
                ))
            })?;

        let base = self.base.metadata_for(class_name)?;
        let target = base.association_target_class(association).ok_or_else(|| {
            Error::InvalidMetadata(format!(
                "class \"{class_name}\" has no association \"{association}\""
            ))
        })?;
        let translation = self.base.metadata_for(target)?;

        Ok(TranslationContext::new(
            translatable,
            translation,
            association_metadata,
            repository,
            object_manager,
        ))
    }

    /// One context per translation association of `class_name`.
    pub fn translation_contexts<'a>(
        &self,
        class_name: &str,
        repository: &'a dyn TranslationRepository,
        object_manager: &'a dyn ObjectManager,
    ) -> Result<Vec<TranslationContext<'a>>> {
        self.class_metadata(class_name)?
            .translation_associations()
            .iter()
            .map(|association| {
                self.translation_context(
                    class_name,
                    association.association_name(),
                    repository,
                    object_manager,
                )
            })
            .collect()
    }

    /// Translation-aware builder over a fresh [`DqlQueryBuilder`].
    pub fn query_builder(&self) -> TranslatableQueryBuilder<'_, DqlQueryBuilder> {
        self.wrap(DqlQueryBuilder::new())
    }

    /// Translation-aware builder over a host query builder.
    pub fn wrap<Q: QueryBuilder>(&self, inner: Q) -> TranslatableQueryBuilder<'_, Q> {
        TranslatableQueryBuilder::new(inner, &self.metadata, self.config())
    }

    /// Fill the translatable properties of a freshly loaded object from its
    /// translations in the current locale, falling back to the default locale.
    /// Associations without either translation are cleared.
    ///
    /// The object's locale becomes the current locale when any association
    /// found a translation in it, else the default locale when one was found
    /// there, else null. The loaded state is observed as the baseline for
    /// [`Self::save_translations`].
    pub fn load_translations(
        &self,
        observer: &PropertyObserver,
        object: &mut dyn Entity,
        repository: &dyn TranslationRepository,
        object_manager: &dyn ObjectManager,
    ) -> Result<()> {
        let config = self.config();
        let locale = config
            .effective_locale(None)
            .ok_or_else(|| Error::InvalidArgument("no locale configured".to_string()))?;
        let fallback = config.fallback_locale_for(Some(locale));

        let class_name = object.class_name().to_string();
        let contexts = self.translation_contexts(&class_name, repository, object_manager)?;
        let Some(first) = contexts.first() else {
            return Ok(());
        };

        let mut in_current = false;
        let mut in_fallback = false;
        for context in &contexts {
            let association = context.association_name();
            let mut found = repository
                .find_translation(object, locale, association)?
                .map(|translation| (translation, locale));
            if found.is_none() {
                if let Some(fallback) = fallback {
                    found = repository
                        .find_translation(object, fallback, association)?
                        .map(|translation| (translation, fallback));
                }
            }

            match found {
                Some((translation, found_locale)) => {
                    in_current |= found_locale == locale;
                    in_fallback |= found_locale != locale;
                    let translation = translation.read();
                    self.helper.copy_translation_properties(
                        context,
                        object,
                        &*translation,
                        found_locale,
                    )?;
                }
                None => self.helper.clear_translated_values(context, object)?,
            }
        }

        let object_locale = if in_current {
            Some(locale)
        } else if in_fallback {
            fallback
        } else {
            None
        };
        self.helper.set_object_locale(first, object, object_locale)?;

        self.helper.observe_locale(first, observer, object)?;
        for context in &contexts {
            self.helper.observe_values(context, observer, object)?;
        }
        Ok(())
    }

    /// Synchronize every translation association of `object` before it is
    /// flushed. Objects without a locale are saved in the default locale.
    ///
    /// A locale change is detected once for the object, so every association
    /// is written in the new locale.
    pub fn save_translations(
        &self,
        observer: &PropertyObserver,
        object: &mut dyn Entity,
        repository: &dyn TranslationRepository,
        object_manager: &dyn ObjectManager,
    ) -> Result<Vec<SyncOutcome>> {
        let config = self.config();
        let default_locale = config
            .default_locale
            .as_deref()
            .or(config.locale.as_deref())
            .ok_or_else(|| Error::InvalidArgument("no default locale configured".to_string()))?;

        let class_name = object.class_name().to_string();
        let contexts = self.translation_contexts(&class_name, repository, object_manager)?;
        let Some(first) = contexts.first() else {
            return Ok(Vec::new());
        };

        let locale_changed = self.helper.has_changed_locale(first, observer, object)?;
        let outcomes = contexts
            .iter()
            .map(|context| {
                self.helper.sync_association(
                    context,
                    observer,
                    object,
                    default_locale,
                    locale_changed,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.helper.observe_locale(first, observer, object)?;
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{PropertyAccess, Record};
    use crate::mapping::MappingRegistry;
    use crate::test_fixtures::{article_registry, product_registry};
    use crate::translatable::{InMemoryTranslationRepository, UnitOfWork};
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn manager(registry: &Arc<MappingRegistry>) -> TranslatableManager {
        TranslatableManager::new(
            registry.clone(),
            TranslatableConfig::new()
                .with_locale("pl")
                .with_default_locale("en"),
        )
    }

    fn repository(manager: &TranslatableManager, registry: &Arc<MappingRegistry>) -> InMemoryTranslationRepository {
        InMemoryTranslationRepository::new(registry.clone(), manager.metadata_factory().clone())
    }

    #[test]
    fn test_locale_settings() {
        let registry = article_registry();
        let manager = manager(&registry);

        manager.set_locale(Some("de".to_string()));
        manager.set_default_locale(None);

        assert_eq!(
            manager.config(),
            TranslatableConfig::new().with_locale("de")
        );
    }

    #[test]
    fn test_translation_context() {
        let registry = article_registry();
        let manager = manager(&registry);
        let repository = repository(&manager, &registry);
        let uow = UnitOfWork::new();

        let context = manager
            .translation_context("Article", "translations", &repository, &uow)
            .unwrap();
        assert_eq!(context.association_name(), "translations");
        assert_eq!(context.translation_metadata().name(), "ArticleTranslation");
        assert!(context.is_collection_field("comments"));
        assert!(!context.is_collection_field("title"));

        assert!(matches!(
            manager.translation_context("Article", "categories", &repository, &uow),
            Err(Error::InvalidMetadata(_))
        ));
        assert_eq!(
            manager
                .translation_contexts("Article", &repository, &uow)
                .unwrap()
                .len(),
            1
        );
        assert!(manager
            .translation_contexts("Category", &repository, &uow)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_query_builder_uses_config() {
        let registry = article_registry();
        let manager = manager(&registry);

        let mut qb = manager.query_builder();
        qb.select("a").from("Article", "a");
        qb.add_translatable_where("a", "title", "Tytuł").unwrap();

        assert_eq!(qb.parameter("atranslationsplloc"), Some(&Value::from("pl")));
        assert_eq!(qb.parameter("atranslationsenloc"), Some(&Value::from("en")));
    }

    #[test]
    fn test_load_falls_back_to_default_locale() {
        let registry = article_registry();
        let manager = manager(&registry);
        let repository = repository(&manager, &registry);
        let uow = UnitOfWork::new();
        let observer = PropertyObserver::new();

        let mut article = Record::from_mapping(&registry.entity("Article").unwrap());
        let en = repository
            .get_translation(&mut article, "en", "translations")
            .unwrap();
        en.write()
            .set_property("title", Value::from("Title"))
            .unwrap();

        manager
            .load_translations(&observer, &mut article, &repository, &uow)
            .unwrap();
        assert_eq!(article.get_property("title").unwrap(), Value::from("Title"));
        assert_eq!(article.get_property("locale").unwrap(), Value::from("en"));
        assert_eq!(article.get_property("comments").unwrap(), Value::empty_collection());

        let pl = repository
            .get_translation(&mut article, "pl", "translations")
            .unwrap();
        pl.write()
            .set_property("title", Value::from("Tytuł"))
            .unwrap();

        manager
            .load_translations(&observer, &mut article, &repository, &uow)
            .unwrap();
        assert_eq!(article.get_property("title").unwrap(), Value::from("Tytuł"));
        assert_eq!(article.get_property("locale").unwrap(), Value::from("pl"));
    }

    #[test]
    fn test_load_without_translation_clears() {
        let registry = article_registry();
        let manager = manager(&registry);
        let repository = repository(&manager, &registry);
        let uow = UnitOfWork::new();
        let observer = PropertyObserver::new();

        let mut article = Record::from_mapping(&registry.entity("Article").unwrap())
            .with_value("title", "stale")
            .with_value("locale", "de");

        manager
            .load_translations(&observer, &mut article, &repository, &uow)
            .unwrap();
        assert_eq!(article.get_property("title").unwrap(), Value::Null);
        assert_eq!(article.get_property("locale").unwrap(), Value::Null);
    }

    #[test]
    fn test_save_after_load_only_when_changed() {
        let registry = article_registry();
        let manager = manager(&registry);
        let repository = repository(&manager, &registry);
        let uow = UnitOfWork::new();
        let observer = PropertyObserver::new();

        let mut article = Record::from_mapping(&registry.entity("Article").unwrap());
        repository
            .get_translation(&mut article, "pl", "translations")
            .unwrap()
            .write()
            .set_property("title", Value::from("Tytuł"))
            .unwrap();

        manager
            .load_translations(&observer, &mut article, &repository, &uow)
            .unwrap();
        let outcomes = manager
            .save_translations(&observer, &mut article, &repository, &uow)
            .unwrap();
        assert!(matches!(outcomes.as_slice(), [SyncOutcome::Unchanged]));

        article
            .set_property("contents", Value::from("Treść"))
            .unwrap();
        let outcomes = manager
            .save_translations(&observer, &mut article, &repository, &uow)
            .unwrap();
        let [SyncOutcome::Copied(translation)] = outcomes.as_slice() else {
            panic!("expected a copied translation, got {outcomes:?}");
        };
        assert_eq!(
            translation.read().get_property("contents").unwrap(),
            Value::from("Treść")
        );
        assert!(uow.contains(translation));
    }

    #[test]
    fn test_save_requires_a_locale() {
        let registry = article_registry();
        let manager = TranslatableManager::new(registry.clone(), TranslatableConfig::new());
        let repository = repository(&manager, &registry);
        let uow = UnitOfWork::new();
        let observer = PropertyObserver::new();
        let mut article = Record::from_mapping(&registry.entity("Article").unwrap());

        assert!(matches!(
            manager.save_translations(&observer, &mut article, &repository, &uow),
            Err(Error::InvalidArgument(_))
        ));
    }

    fn has_row(
        repository: &InMemoryTranslationRepository,
        product: &Record,
        locale: &str,
        association: &str,
    ) -> bool {
        repository
            .find_translation(product, locale, association)
            .unwrap()
            .is_some()
    }

    #[test]
    fn test_locale_change_saves_every_association() {
        let registry = product_registry();
        let manager = manager(&registry);
        let repository = repository(&manager, &registry);
        let uow = UnitOfWork::new();
        let observer = PropertyObserver::new();

        let mut product = Record::from_mapping(&registry.entity("Product").unwrap())
            .with_value("locale", "en")
            .with_value("name", "Chair")
            .with_value("slug", "chair");
        let outcomes = manager
            .save_translations(&observer, &mut product, &repository, &uow)
            .unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [SyncOutcome::Copied(_), SyncOutcome::Copied(_)]
        ));

        product.set_property("locale", Value::from("pl")).unwrap();
        let outcomes = manager
            .save_translations(&observer, &mut product, &repository, &uow)
            .unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [SyncOutcome::Copied(_), SyncOutcome::Copied(_)]
        ));
        assert!(has_row(&repository, &product, "pl", "translations"));
        assert!(has_row(&repository, &product, "pl", "seo"));

        let outcomes = manager
            .save_translations(&observer, &mut product, &repository, &uow)
            .unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [SyncOutcome::Unchanged, SyncOutcome::Unchanged]
        ));
    }

    #[test]
    fn test_load_keeps_locale_of_any_found_association() {
        let registry = product_registry();
        let manager = manager(&registry);
        let repository = repository(&manager, &registry);
        let uow = UnitOfWork::new();
        let observer = PropertyObserver::new();

        let mut product = Record::from_mapping(&registry.entity("Product").unwrap())
            .with_value("name", "stale");
        repository
            .get_translation(&mut product, "pl", "seo")
            .unwrap()
            .write()
            .set_property("slug", Value::from("krzeslo"))
            .unwrap();

        manager
            .load_translations(&observer, &mut product, &repository, &uow)
            .unwrap();
        assert_eq!(product.get_property("slug").unwrap(), Value::from("krzeslo"));
        assert_eq!(product.get_property("name").unwrap(), Value::Null);
        assert_eq!(product.get_property("locale").unwrap(), Value::from("pl"));

        let outcomes = manager
            .save_translations(&observer, &mut product, &repository, &uow)
            .unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [SyncOutcome::Unchanged, SyncOutcome::Unchanged]
        ));
    }
}
