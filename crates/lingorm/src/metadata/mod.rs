//! Extended class metadata: a generic per-class store and the typed
//! translatable and uploadable models built on it.

mod class;
mod factory;
mod translatable;
mod uploadable;

pub use class::{ClassMetadata, ExtendedMetadata};
pub use factory::MetadataFactory;
pub use translatable::{TranslatableClassMetadata, TranslationAssociationMetadata};
pub use uploadable::{UploadableClassMetadata, UploadableProperty};
