//! Generic extended class metadata.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

/// Extended metadata types built per class by a mapping driver.
pub trait ExtendedMetadata: Send + Sync + 'static {
    /// Create empty metadata for a class.
    fn for_class(class_name: &str) -> Self
    where
        Self: Sized;

    /// Name of the described class.
    fn class_name(&self) -> &str;
}

/// Key/value store attached to a class, scoped three ways: class level,
/// per property and per method.
///
/// Every `add_*` call is an upsert: the last value written under an index
/// wins. Lookups return `None` for absent indexes, so a stored `false` or
/// `null` is never confused with absence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassMetadata {
    class_name: String,
    class_metadata: BTreeMap<String, JsonValue>,
    property_metadata: BTreeMap<String, BTreeMap<String, JsonValue>>,
    method_metadata: BTreeMap<String, BTreeMap<String, JsonValue>>,
}

impl ClassMetadata {
    /// Create empty metadata for a class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    /// Name of the described class.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Store `value` under `index` at class level.
    pub fn add_class_metadata(
        &mut self,
        index: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> &mut Self {
        self.class_metadata.insert(index.into(), value.into());
        self
    }

    /// Check if a class-level value exists under `index`.
    pub fn has_class_metadata(&self, index: &str) -> bool {
        self.class_metadata.contains_key(index)
    }

    /// Class-level value under `index`.
    pub fn class_metadata(&self, index: &str) -> Option<&JsonValue> {
        self.class_metadata.get(index)
    }

    /// All class-level values.
    pub fn all_class_metadata(&self) -> &BTreeMap<String, JsonValue> {
        &self.class_metadata
    }

    /// Store `value` under `index` for `property`.
    pub fn add_property_metadata(
        &mut self,
        property: impl Into<String>,
        index: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> &mut Self {
        self.property_metadata
            .entry(property.into())
            .or_default()
            .insert(index.into(), value.into());
        self
    }

    /// Check if `property` has a value under `index`.
    pub fn has_property_metadata(&self, property: &str, index: &str) -> bool {
        self.property_metadata(property, index).is_some()
    }

    /// Value stored under `index` for `property`.
    pub fn property_metadata(&self, property: &str, index: &str) -> Option<&JsonValue> {
        self.property_metadata
            .get(property)
            .and_then(|values| values.get(index))
    }

    /// All property-level values, keyed by property then index.
    pub fn all_property_metadata(&self) -> &BTreeMap<String, BTreeMap<String, JsonValue>> {
        &self.property_metadata
    }

    /// Store `value` under `index` for `method`.
    pub fn add_method_metadata(
        &mut self,
        method: impl Into<String>,
        index: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> &mut Self {
        self.method_metadata
            .entry(method.into())
            .or_default()
            .insert(index.into(), value.into());
        self
    }

    /// Check if `method` has a value under `index`.
    pub fn has_method_metadata(&self, method: &str, index: &str) -> bool {
        self.method_metadata(method, index).is_some()
    }

    /// Value stored under `index` for `method`.
    pub fn method_metadata(&self, method: &str, index: &str) -> Option<&JsonValue> {
        self.method_metadata
            .get(method)
            .and_then(|values| values.get(index))
    }

    /// All method-level values, keyed by method then index.
    pub fn all_method_metadata(&self) -> &BTreeMap<String, BTreeMap<String, JsonValue>> {
        &self.method_metadata
    }
}

impl ExtendedMetadata for ClassMetadata {
    fn for_class(class_name: &str) -> Self {
        ClassMetadata::new(class_name)
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_class_metadata_upsert() {
        let mut metadata = ClassMetadata::new("Article");
        metadata
            .add_class_metadata("cache", true)
            .add_class_metadata("cache", false);

        assert!(metadata.has_class_metadata("cache"));
        assert_eq!(metadata.class_metadata("cache"), Some(&json!(false)));
        assert_eq!(metadata.all_class_metadata().len(), 1);
    }

    #[test]
    fn test_falsy_value_is_not_absence() {
        let mut metadata = ClassMetadata::new("Article");
        metadata.add_property_metadata("title", "nullable", JsonValue::Null);

        assert!(metadata.has_property_metadata("title", "nullable"));
        assert_eq!(
            metadata.property_metadata("title", "nullable"),
            Some(&JsonValue::Null)
        );
        assert!(!metadata.has_property_metadata("title", "length"));
        assert_eq!(metadata.property_metadata("title", "length"), None);
        assert_eq!(metadata.property_metadata("missing", "nullable"), None);
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut metadata = ClassMetadata::new("Article");
        metadata
            .add_class_metadata("name", "class")
            .add_property_metadata("name", "name", "property")
            .add_method_metadata("name", "name", "method");

        assert_eq!(metadata.class_metadata("name"), Some(&json!("class")));
        assert_eq!(metadata.property_metadata("name", "name"), Some(&json!("property")));
        assert_eq!(metadata.method_metadata("name", "name"), Some(&json!("method")));
        assert!(!metadata.has_method_metadata("title", "name"));
    }

    #[test]
    fn test_property_metadata_last_write_wins() {
        let mut metadata = ClassMetadata::new("Article");
        metadata
            .add_property_metadata("title", "target", "title")
            .add_property_metadata("title", "length", 255)
            .add_property_metadata("title", "target", "headline");

        assert_eq!(metadata.property_metadata("title", "target"), Some(&json!("headline")));
        assert_eq!(metadata.all_property_metadata()["title"].len(), 2);
        assert_eq!(metadata.class_name(), "Article");
    }
}
