//! Drivers turning property markers into extended metadata.

use tracing::trace;

use crate::error::{Error, Result};
use crate::metadata::{
    ExtendedMetadata, TranslatableClassMetadata, UploadableClassMetadata, UploadableProperty,
};

use super::base::{BaseClassMetadata, BaseMetadataFactory};
use super::property::PropertyDecl;

/// Reads the declared properties of a class and fills one kind of extended
/// metadata.
pub trait MappingDriver: Send + Sync {
    /// Metadata type produced by this driver.
    type Metadata: ExtendedMetadata;

    /// Build the extended metadata of a class.
    ///
    /// Transient classes get empty metadata.
    fn load_class_metadata(
        &self,
        base_factory: &dyn BaseMetadataFactory,
        class_name: &str,
    ) -> Result<Self::Metadata> {
        let mut extended = Self::Metadata::for_class(class_name);
        if base_factory.is_transient(class_name) {
            trace!(class = class_name, "skipping transient class");
            return Ok(extended);
        }

        let base = base_factory.metadata_for(class_name)?;
        self.load_extended_class_metadata(base.as_ref(), &mut extended)?;
        Ok(extended)
    }

    /// Register the markers of the class's own properties into `extended`.
    fn load_extended_class_metadata(
        &self,
        base: &dyn BaseClassMetadata,
        extended: &mut Self::Metadata,
    ) -> Result<()>;
}

/// Properties whose markers belong to another class's metadata: non-private
/// properties of a mapped superclass, inherited fields and inherited
/// associations.
pub fn is_inherited_property(base: &dyn BaseClassMetadata, property: &PropertyDecl) -> bool {
    (base.is_mapped_superclass() && !property.is_private())
        || base.is_inherited_field(&property.name)
        || base.is_inherited_association(&property.name)
}

fn own_properties(base: &dyn BaseClassMetadata) -> impl Iterator<Item = &PropertyDecl> {
    base.declared_properties()
        .iter()
        .filter(move |property| !is_inherited_property(base, property))
}

/// Driver for translatable and locale markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranslatableDriver;

impl MappingDriver for TranslatableDriver {
    type Metadata = TranslatableClassMetadata;

    fn load_extended_class_metadata(
        &self,
        base: &dyn BaseClassMetadata,
        extended: &mut TranslatableClassMetadata,
    ) -> Result<()> {
        for property in own_properties(base) {
            if let Some(marker) = property.translatable_marker() {
                let mapped_by = marker.mapped_by.as_deref().ok_or_else(|| {
                    Error::mapping(
                        base.name(),
                        &property.name,
                        "translatable marker does not have required attribute `mapped_by`",
                    )
                })?;

                extended.add_translatable_property(
                    mapped_by,
                    &property.name,
                    marker.target_field.as_deref(),
                )?;
            }

            if property.is_locale() {
                extended.set_locale_property(property.name.as_str());
            }
        }

        Ok(())
    }
}

/// Driver for uploadable markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UploadableDriver;

impl MappingDriver for UploadableDriver {
    type Metadata = UploadableClassMetadata;

    fn load_extended_class_metadata(
        &self,
        base: &dyn BaseClassMetadata,
        extended: &mut UploadableClassMetadata,
    ) -> Result<()> {
        for property in own_properties(base) {
            let Some(marker) = property.uploadable_marker() else {
                continue;
            };

            let target_field = marker.target_field.clone().ok_or_else(|| {
                Error::mapping(
                    base.name(),
                    &property.name,
                    "uploadable marker does not have required attribute `target_field`",
                )
            })?;

            extended.add_uploadable_property(
                &property.name,
                UploadableProperty {
                    target_field,
                    filesystem: marker.filesystem.clone(),
                    keymaker: marker.keymaker.clone(),
                    key_length: marker.key_length,
                    key_pattern: marker.key_pattern.clone(),
                },
            )?;
        }

        Ok(())
    }
}
