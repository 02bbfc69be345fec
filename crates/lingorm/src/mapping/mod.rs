//! Host mapping model: the metadata traits the extensions consume, property
//! markers, and an in-memory reference implementation.

mod base;
mod driver;
mod entity;
mod property;
mod registry;

pub use base::{BaseClassMetadata, BaseMetadataFactory};
pub use driver::{is_inherited_property, MappingDriver, TranslatableDriver, UploadableDriver};
pub use entity::{AssociationMapping, Cardinality, EntityMapping, FieldMapping};
pub use property::{Marker, PropertyDecl, TranslatableMarker, UploadableMarker, Visibility};
pub use registry::MappingRegistry;
