//! Integration tests for translation synchronization.

use std::sync::Arc;

use lingorm::{
    entity_handle, Cardinality, EntityMapping, InMemoryTranslationRepository, MappingRegistry,
    ObjectManager, PropertyAccess, PropertyDecl, PropertyObserver, Record, SyncOutcome,
    TranslatableConfig, TranslatableManager, TranslationContext, TranslationRepository,
    UnitOfWork, Value,
};
use pretty_assertions::assert_eq;

struct TestContext {
    registry: Arc<MappingRegistry>,
    manager: TranslatableManager,
    repository: InMemoryTranslationRepository,
    uow: UnitOfWork,
    observer: PropertyObserver,
}

impl TestContext {
    fn new(config: TranslatableConfig) -> Self {
        let registry = blog_schema();
        let manager = TranslatableManager::new(registry.clone(), config);
        let repository =
            InMemoryTranslationRepository::new(registry.clone(), manager.metadata_factory().clone());

        Self {
            registry,
            manager,
            repository,
            uow: UnitOfWork::new(),
            observer: PropertyObserver::new(),
        }
    }

    fn context(&self) -> TranslationContext<'_> {
        self.manager
            .translation_context("Post", "translations", &self.repository, &self.uow)
            .unwrap()
    }

    fn post(&self) -> Record {
        Record::from_mapping(&self.registry.entity("Post").unwrap())
    }

    fn save(&self, post: &mut Record) -> SyncOutcome {
        let mut outcomes = self
            .manager
            .save_translations(&self.observer, post, &self.repository, &self.uow)
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        outcomes.remove(0)
    }
}

fn blog_schema() -> Arc<MappingRegistry> {
    let post = EntityMapping::new("Post", "id")
        .with_field("published_at")
        .with_association("translations", "PostTranslation", Cardinality::OneToMany)
        .with_property(PropertyDecl::private("locale").locale())
        .with_property(PropertyDecl::private("title").translatable("translations"))
        .with_property(PropertyDecl::private("body").translatable("translations"))
        .with_property(PropertyDecl::private("tags").translatable("translations"));

    let translation = EntityMapping::new("PostTranslation", "id")
        .with_field("locale")
        .with_field("title")
        .with_field("body")
        .with_association("tags", "Tag", Cardinality::ManyToMany)
        .with_association("post", "Post", Cardinality::ManyToOne)
        .with_property(PropertyDecl::private("locale").locale());

    let tag = EntityMapping::new("Tag", "id").with_field("label");

    Arc::new(
        MappingRegistry::new()
            .with(post)
            .with(translation)
            .with(tag),
    )
}

fn tag(label: &str) -> Value {
    entity_handle(Record::new("Tag", ["id", "label"]).with_value("label", label)).into()
}

#[test]
fn test_empty_translation_is_removed_with_same_locales() {
    let ctx = TestContext::new(
        TranslatableConfig::new()
            .with_locale("en")
            .with_default_locale("en"),
    );
    let context = ctx.context();
    let helper = ctx.manager.helper();

    let mut post = ctx.post().with_value("locale", "en");
    assert!(!helper.has_translated_properties(&context, &post).unwrap());
    assert!(!helper.remove_empty_translation(&context, &mut post).unwrap());

    post.set_property("title", Value::from("Hello")).unwrap();
    assert!(helper.has_translated_properties(&context, &post).unwrap());
    let SyncOutcome::Copied(translation) = ctx.save(&mut post) else {
        panic!("translation was not copied");
    };
    assert!(ctx.uow.contains(&translation));
    assert_eq!(
        translation.read().get_property("title").unwrap(),
        Value::from("Hello")
    );

    post.set_property("title", Value::Null).unwrap();
    assert!(!helper.has_translated_properties(&context, &post).unwrap());
    assert!(matches!(ctx.save(&mut post), SyncOutcome::Removed));

    assert!(ctx.uow.is_removed(&translation));
    assert!(!ctx.uow.contains(&translation));
    assert!(ctx
        .repository
        .get_translations(&post, "translations")
        .unwrap()
        .is_empty());
}

#[test]
fn test_object_without_locale_is_saved_in_default_locale() {
    let ctx = TestContext::new(
        TranslatableConfig::new()
            .with_locale("pl")
            .with_default_locale("en"),
    );
    let mut post = ctx
        .post()
        .with_value("body", "Body")
        .with_value("tags", vec![tag("rust"), tag("orm")]);

    let SyncOutcome::Copied(translation) = ctx.save(&mut post) else {
        panic!("translation was not copied");
    };

    let translation = translation.read();
    assert_eq!(translation.get_property("locale").unwrap(), Value::from("en"));
    assert_eq!(translation.get_property("body").unwrap(), Value::from("Body"));
    assert_eq!(translation.get_property("title").unwrap(), Value::Null);
    assert_eq!(
        translation.get_property("tags").unwrap().as_collection().map(<[Value]>::len),
        Some(2)
    );
}

#[test]
fn test_translations_per_locale() {
    let ctx = TestContext::new(
        TranslatableConfig::new()
            .with_locale("pl")
            .with_default_locale("en"),
    );
    let mut post = ctx.post();

    post.set_property("locale", Value::from("en")).unwrap();
    post.set_property("title", Value::from("Hello")).unwrap();
    ctx.save(&mut post);

    post.set_property("locale", Value::from("pl")).unwrap();
    post.set_property("title", Value::from("Cześć")).unwrap();
    ctx.save(&mut post);

    assert_eq!(ctx.uow.managed().len(), 2);
    let titles: Vec<Value> = ctx
        .repository
        .get_translations(&post, "translations")
        .unwrap()
        .iter()
        .map(|translation| translation.handle().read().get_property("title").unwrap())
        .collect();
    assert_eq!(titles, vec![Value::from("Hello"), Value::from("Cześć")]);

    let mut reloaded = ctx.post();
    reloaded
        .set_property("translations", post.get_property("translations").unwrap())
        .unwrap();
    ctx.manager
        .load_translations(&ctx.observer, &mut reloaded, &ctx.repository, &ctx.uow)
        .unwrap();
    assert_eq!(reloaded.get_property("title").unwrap(), Value::from("Cześć"));
    assert_eq!(reloaded.get_property("locale").unwrap(), Value::from("pl"));
    assert!(matches!(ctx.save(&mut reloaded), SyncOutcome::Unchanged));
}

#[test]
fn test_observer_tracks_objects_independently() {
    let ctx = TestContext::new(TranslatableConfig::new().with_default_locale("en"));
    let context = ctx.context();
    let helper = ctx.manager.helper();

    let first = ctx.post().with_value("title", "First");
    let mut second = ctx.post().with_value("title", "Second");

    helper.observe(&context, &ctx.observer, &first).unwrap();
    helper.observe(&context, &ctx.observer, &second).unwrap();
    second.set_property("title", Value::from("Changed")).unwrap();

    assert!(!helper
        .has_changed_translatable_properties(&context, &ctx.observer, &first)
        .unwrap());
    assert!(helper
        .has_changed_translatable_properties(&context, &ctx.observer, &second)
        .unwrap());

    ctx.observer.remove(&second);
    assert_eq!(ctx.observer.tracked_objects(), 1);
}
