//! Locale configuration for translatable entities.

use serde::{Deserialize, Serialize};

/// Locale settings shared by translation synchronization and query rewriting.
///
/// Hosts usually embed this in their own configuration file:
///
/// ```
/// # use lingorm::TranslatableConfig;
/// let config: TranslatableConfig =
///     serde_json::from_str(r#"{ "locale": "pl", "default_locale": "en" }"#).unwrap();
/// assert_eq!(config.fallback_locale_for(Some("pl")), Some("en"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatableConfig {
    /// Locale active for the current operation.
    pub locale: Option<String>,

    /// Locale used when the current locale has no translation.
    pub default_locale: Option<String>,
}

impl TranslatableConfig {
    /// Create a configuration with neither locale set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the default (fallback) locale.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Locale to read in: `explicit`, else the current locale, else the
    /// default locale.
    pub fn effective_locale<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit
            .or(self.locale.as_deref())
            .or(self.default_locale.as_deref())
    }

    /// The locale to fall back to when reading in `locale`.
    ///
    /// `None` means a single locale is involved: no default is configured or
    /// it equals `locale`.
    pub fn fallback_locale_for(&self, locale: Option<&str>) -> Option<&str> {
        match self.default_locale.as_deref() {
            Some(default) if Some(default) != locale => Some(default),
            _ => None,
        }
    }
}
