//! Key lookup with locale fallback and interpolation

use std::sync::Arc;

use conch_core::prelude::*;

use crate::catalog::{Catalog, CatalogSet, Message};
use crate::detect::{select_locale, LocaleDetector};
use crate::plural::substitute_count;

/// Renders message keys in the locale chosen at startup.
///
/// Lookup order is the selected catalog, then the default catalog, then the
/// raw key. Rendering never fails and never yields an empty string for a
/// non-empty key.
#[derive(Debug, Clone)]
pub struct Translator {
    locale: String,
    catalog: Arc<Catalog>,
    fallback: Arc<Catalog>,
}

impl Translator {
    /// Select a locale for `preferences` and bind its catalog.
    pub fn new(catalogs: &CatalogSet, preferences: &[String]) -> Result<Self> {
        let default = catalogs.default_locale();
        let locale = select_locale(catalogs.supported(), preferences, default);
        let fallback = catalogs
            .get(default)
            .ok_or_else(|| Error::catalog(default, "default catalog is not registered"))?;
        let catalog = catalogs
            .get(&locale)
            .unwrap_or_else(|| Arc::clone(&fallback));

        info!(
            "Language: {} (preferences: {:?}, supported: {:?})",
            locale,
            preferences,
            catalogs.supported()
        );

        Ok(Self {
            locale,
            catalog,
            fallback,
        })
    }

    /// Select using a detection collaborator.
    pub fn detect(catalogs: &CatalogSet, detector: &dyn LocaleDetector) -> Result<Self> {
        Self::new(catalogs, &detector.preferred_locales())
    }

    /// The locale code that won selection (may be an alias such as `ko-KR`).
    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Look up a message through the fallback chain.
    pub fn lookup(&self, key: &str) -> Result<&Message> {
        if let Some(message) = self.catalog.get(key) {
            return Ok(message);
        }
        if let Some(message) = self.fallback.get(key) {
            debug!(
                "Translation key '{}' not found in '{}', using '{}'",
                key,
                self.locale,
                self.fallback.locale()
            );
            return Ok(message);
        }
        Err(Error::translation_missing(key, &self.locale))
    }

    /// Render a literal message.
    ///
    /// Plural entries need a count; asked for without one they render the
    /// key, like a missing message.
    pub fn t(&self, key: &str) -> String {
        match self.lookup(key) {
            Ok(Message::Text(text)) => text.clone(),
            Ok(Message::Plural(_)) => {
                debug!("Plural message '{}' rendered without a count", key);
                key.to_string()
            }
            Err(e) => {
                debug!("{}; rendering key", e);
                key.to_string()
            }
        }
    }

    /// Render a message for count `n`, substituting `%n`.
    pub fn tn(&self, key: &str, n: i64) -> String {
        match self.lookup(key) {
            Ok(Message::Plural(table)) => table
                .render(n)
                .unwrap_or_else(|| substitute_count(key, n)),
            Ok(Message::Text(text)) => substitute_count(text, n),
            Err(e) => {
                debug!("{}; rendering key", e);
                substitute_count(key, n)
            }
        }
    }

    /// Render a literal message, replacing `{name}` placeholders.
    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.t(key);
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }
}
