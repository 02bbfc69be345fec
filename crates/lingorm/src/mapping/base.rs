//! Host ORM metadata consumed by the drivers, the helper and the query engine.

use std::sync::Arc;

use crate::error::Result;

use super::property::PropertyDecl;

/// Mapping information the host ORM keeps for one class.
pub trait BaseClassMetadata: Send + Sync {
    /// Class name.
    fn name(&self) -> &str;

    /// Check if the class is a mapped superclass (not an entity on its own).
    fn is_mapped_superclass(&self) -> bool;

    /// Check if `field` is a column inherited from a parent class.
    fn is_inherited_field(&self, field: &str) -> bool;

    /// Check if `association` is inherited from a parent class.
    fn is_inherited_association(&self, association: &str) -> bool;

    /// Check if `name` is a mapped association.
    fn has_association(&self, name: &str) -> bool;

    /// Check if `name` is a to-many association.
    fn is_collection_valued_association(&self, name: &str) -> bool;

    /// Target class of an association.
    fn association_target_class(&self, name: &str) -> Option<&str>;

    /// Name of the identifier field.
    fn identifier_field(&self) -> &str;

    /// Properties declared by the class, with their markers.
    fn declared_properties(&self) -> &[PropertyDecl];
}

/// Source of host class metadata.
pub trait BaseMetadataFactory: Send + Sync {
    /// Check if the class is not persisted by the host (no metadata to extend).
    fn is_transient(&self, class_name: &str) -> bool;

    /// Mapping information of a class.
    fn metadata_for(&self, class_name: &str) -> Result<Arc<dyn BaseClassMetadata>>;
}
