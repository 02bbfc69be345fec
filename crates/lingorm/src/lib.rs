//! lingorm - Translatable and uploadable entity extensions for ORMs.
//!
//! This crate provides extended class metadata driven by property markers,
//! a property change observer, translation synchronization between entities
//! and their per-locale translation rows, and translation-aware rewriting of
//! DQL queries.

pub mod access;
pub mod config;
pub mod error;
pub mod mapping;
pub mod metadata;
pub mod observer;
pub mod query;
pub mod translatable;
pub mod value;

#[cfg(test)]
mod test_fixtures;

pub use access::{entity_handle, same_entity, Entity, EntityHandle, ObjectId, PropertyAccess, Record};
pub use config::TranslatableConfig;
pub use error::{Error, Result};
pub use mapping::{
    BaseClassMetadata, BaseMetadataFactory, Cardinality, EntityMapping, MappingDriver,
    MappingRegistry, PropertyDecl, TranslatableDriver, UploadableDriver,
};
pub use metadata::{
    MetadataFactory, TranslatableClassMetadata, TranslationAssociationMetadata,
    UploadableClassMetadata, UploadableProperty,
};
pub use observer::PropertyObserver;
pub use query::{
    DqlQueryBuilder, JoinKind, OrderDirection, QueryBuilder, TranslatableQueryBuilder,
    TranslationJoin,
};
pub use translatable::{
    InMemoryTranslationRepository, ObjectManager, SyncOutcome, TranslatableManager,
    TranslationContext, TranslationHelper, TranslationRepository, UnitOfWork,
};
pub use value::{EntityRef, Value};
