//! Message catalogs and the locale registry
//!
//! Catalogs are TOML documents:
//!
//! ```toml
//! locale = "ko"
//! aliases = ["ko-KR"]
//!
//! [values]
//! "Racks" = "랙"
//! "%n problems found" = [
//!     { min = 1, max = 1, text = "문제 1개 발견" },
//!     { min = 2, text = "문제 %n개 발견" },
//! ]
//! ```
//!
//! Each alias is registered as the same `Arc<Catalog>` as its base locale.

use std::collections::HashMap;
use std::sync::Arc;

use conch_core::prelude::*;
use serde::Deserialize;

use crate::plural::PluralTable;

/// Locale used when nothing the user prefers is supported.
pub const DEFAULT_LOCALE: &str = "en";

const BUILTIN_CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.toml")),
    ("ko", include_str!("../locales/ko.toml")),
];

/// A catalog entry: a literal string or a count-selected table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Plural(PluralTable),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    locale: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    values: HashMap<String, Message>,
}

/// Translated message templates for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    locale: String,
    aliases: Vec<String>,
    messages: HashMap<String, Message>,
}

impl Catalog {
    /// Parse a catalog from TOML source.
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(source).map_err(|e| Error::catalog("<unparsed>", e.to_string()))?;
        if file.locale.trim().is_empty() {
            return Err(Error::catalog("<unnamed>", "missing `locale`"));
        }
        Ok(Self {
            locale: file.locale,
            aliases: file.aliases,
            messages: file.values,
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn get(&self, key: &str) -> Option<&Message> {
        self.messages.get(key)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Every loaded catalog, indexed by locale code and alias.
#[derive(Debug, Clone)]
pub struct CatalogSet {
    default_locale: String,
    /// Registered codes in registration order, aliases included.
    supported: Vec<String>,
    catalogs: HashMap<String, Arc<Catalog>>,
}

impl CatalogSet {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            supported: Vec::new(),
            catalogs: HashMap::new(),
        }
    }

    /// The catalogs shipped with the console (`en` default, `ko` with `ko-KR`).
    pub fn builtin() -> Result<Self> {
        let mut set = Self::new(DEFAULT_LOCALE);
        for (locale, source) in BUILTIN_CATALOGS {
            set.register_toml(source).with_context(|| {
                format!("failed to parse built-in catalog '{}'", locale)
            })?;
        }
        Ok(set)
    }

    pub fn register_toml(&mut self, source: &str) -> Result<Arc<Catalog>> {
        let catalog = Catalog::from_toml(source)?;
        Ok(self.register(catalog))
    }

    /// Register a catalog under its locale and every alias it declares.
    pub fn register(&mut self, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        let codes = std::iter::once(catalog.locale().to_string())
            .chain(catalog.aliases().iter().cloned());
        for code in codes {
            if !self.supported.contains(&code) {
                self.supported.push(code.clone());
            }
            self.catalogs.insert(code, Arc::clone(&catalog));
        }
        debug!(
            "Registered catalog '{}' ({} messages, aliases: {:?})",
            catalog.locale(),
            catalog.len(),
            catalog.aliases()
        );
        catalog
    }

    /// Make `alias` resolve to the catalog already registered as `target`.
    pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> Result<()> {
        let catalog = self
            .catalogs
            .get(target)
            .cloned()
            .ok_or_else(|| Error::catalog(target, "cannot alias an unregistered locale"))?;
        let alias = alias.into();
        if !self.supported.contains(&alias) {
            self.supported.push(alias.clone());
        }
        self.catalogs.insert(alias, catalog);
        Ok(())
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    pub fn get(&self, locale: &str) -> Option<Arc<Catalog>> {
        self.catalogs.get(locale).cloned()
    }

    /// Catalog for `locale`, or the default catalog when it is not registered.
    pub fn get_or_default(&self, locale: &str) -> Option<Arc<Catalog>> {
        self.get(locale).or_else(|| self.get(&self.default_locale))
    }
}
