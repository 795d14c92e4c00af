//! # conch-i18n - Translation Engine
//!
//! Resolves the session language from the user's preferences, binds the
//! matching message catalog with a fallback to the default locale, and renders
//! keys including count-based plural messages.
//!
//! Depends only on [`conch_core`] for error types. Nothing here touches the
//! network or the entity stores.
//!
//! ## Public API
//!
//! - [`CatalogSet`], [`Catalog`], [`Message`] - TOML catalogs with locale aliasing
//! - [`PluralTable`], [`PluralRange`] - Ordered `(min, max, template)` ranges
//! - [`LocaleDetector`], [`EnvLocaleDetector`], [`FixedLocale`] - Preference sources
//! - [`select_locale()`] - First supported preference, else the default
//! - [`Translator`] - `t`, `tn` and `t_args` with key-as-text fallback

pub mod catalog;
pub mod detect;
pub mod plural;
pub mod translator;

pub use catalog::{Catalog, CatalogSet, Message, DEFAULT_LOCALE};
pub use detect::{
    normalize_locale, primary_language, select_locale, EnvLocaleDetector, FixedLocale,
    LocaleDetector,
};
pub use plural::{PluralRange, PluralTable};
pub use translator::Translator;
