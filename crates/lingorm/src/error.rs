//! Core error types.

use crate::access::ObjectId;
use thiserror::Error;

/// Errors raised by metadata loading, change tracking, translation
/// synchronization and query rewriting.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument passed by the caller is not acceptable (unknown join type,
    /// malformed join path, unknown query alias, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No baseline has been recorded for the property of the observed object.
    #[error("no value has been saved for property \"{property}\" of object {object}")]
    UnknownProperty {
        /// Identity of the observed object.
        object: ObjectId,
        /// Property name.
        property: String,
    },

    /// A declarative marker on an entity property is malformed or incomplete.
    #[error("mapping error in class \"{class}\", property \"{property}\": {message}")]
    Mapping {
        /// Class declaring the property.
        class: String,
        /// Offending property.
        property: String,
        /// What is wrong with the marker.
        message: String,
    },

    /// Extended metadata would become inconsistent or is missing a required part.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The host has no mapping for the class.
    #[error("class \"{0}\" is not mapped")]
    UnknownClass(String),

    /// The entity does not expose the requested property.
    #[error("property \"{property}\" is not accessible on class \"{class}\"")]
    PropertyAccess {
        /// Class of the accessed object.
        class: String,
        /// Property name.
        property: String,
    },

    /// A property holds a value of an unexpected kind.
    #[error("unexpected value for \"{class}.{property}\": expected {expected}")]
    UnexpectedValue {
        /// Class of the accessed object.
        class: String,
        /// Property name.
        property: String,
        /// Human readable description of the expected value kind.
        expected: &'static str,
    },

    /// Failure reported by a persistence collaborator (repository, object manager).
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// Create a mapping error for a property of a class.
    pub fn mapping(
        class: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Mapping {
            class: class.into(),
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create a property access error.
    pub fn property_access(class: impl Into<String>, property: impl Into<String>) -> Self {
        Error::PropertyAccess {
            class: class.into(),
            property: property.into(),
        }
    }
}

/// Result type for lingorm operations.
pub type Result<T> = std::result::Result<T, Error>;
