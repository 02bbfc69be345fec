//! Property declarations and their behavior markers.

/// Visibility of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Visible to the declaring class only.
    #[default]
    Private,
    /// Visible to subclasses.
    Protected,
    /// Visible everywhere.
    Public,
}

/// Translatable marker attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslatableMarker {
    /// Association holding the translation rows. Required.
    pub mapped_by: Option<String>,
    /// Field of the translation row; the property name when absent.
    pub target_field: Option<String>,
}

/// Uploadable marker attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadableMarker {
    /// Property receiving the stored file key. Required.
    pub target_field: Option<String>,
    /// Named filesystem.
    pub filesystem: Option<String>,
    /// Named key generator.
    pub keymaker: Option<String>,
    /// Maximum key length.
    pub key_length: Option<u32>,
    /// Key generator pattern.
    pub key_pattern: Option<String>,
}

/// A behavior marker attached to a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// The value lives on a per-locale translation row.
    Translatable(TranslatableMarker),
    /// The property holds the object's current locale.
    Locale,
    /// The property holds a file stored elsewhere.
    Uploadable(UploadableMarker),
}

/// A property declared by an entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    /// Property name.
    pub name: String,
    /// Declared visibility.
    pub visibility: Visibility,
    /// Attached markers.
    pub markers: Vec<Marker>,
}

impl PropertyDecl {
    /// Declare a private property.
    pub fn private(name: impl Into<String>) -> Self {
        Self::with_visibility(name, Visibility::Private)
    }

    /// Declare a protected property.
    pub fn protected(name: impl Into<String>) -> Self {
        Self::with_visibility(name, Visibility::Protected)
    }

    /// Declare a public property.
    pub fn public(name: impl Into<String>) -> Self {
        Self::with_visibility(name, Visibility::Public)
    }

    fn with_visibility(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            markers: Vec::new(),
        }
    }

    /// Attach a marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Mark as translatable through `mapped_by`.
    pub fn translatable(self, mapped_by: impl Into<String>) -> Self {
        self.with_marker(Marker::Translatable(TranslatableMarker {
            mapped_by: Some(mapped_by.into()),
            target_field: None,
        }))
    }

    /// Mark as translatable through `mapped_by`, stored in `target_field`.
    pub fn translatable_as(
        self,
        mapped_by: impl Into<String>,
        target_field: impl Into<String>,
    ) -> Self {
        self.with_marker(Marker::Translatable(TranslatableMarker {
            mapped_by: Some(mapped_by.into()),
            target_field: Some(target_field.into()),
        }))
    }

    /// Mark as the locale holder.
    pub fn locale(self) -> Self {
        self.with_marker(Marker::Locale)
    }

    /// Mark as uploadable, storing the key in `target_field`.
    pub fn uploadable(self, target_field: impl Into<String>) -> Self {
        self.with_marker(Marker::Uploadable(UploadableMarker {
            target_field: Some(target_field.into()),
            ..Default::default()
        }))
    }

    /// Check if the property is private.
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// The translatable marker, if any.
    pub fn translatable_marker(&self) -> Option<&TranslatableMarker> {
        self.markers.iter().find_map(|marker| match marker {
            Marker::Translatable(translatable) => Some(translatable),
            _ => None,
        })
    }

    /// The uploadable marker, if any.
    pub fn uploadable_marker(&self) -> Option<&UploadableMarker> {
        self.markers.iter().find_map(|marker| match marker {
            Marker::Uploadable(uploadable) => Some(uploadable),
            _ => None,
        })
    }

    /// Check if the property carries the locale marker.
    pub fn is_locale(&self) -> bool {
        self.markers.contains(&Marker::Locale)
    }
}
