//! Console error taxonomy
//!
//! Browsing errors (`LoadFailed`, `NotFound`, `RouteUnmatched`,
//! `TranslationMissing`) never escape as failures of a navigation: they are
//! recovered into UI state. Only startup configuration and catalog problems
//! are fatal.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ── Entity stores ────────────────────────────────────────────────
    /// Network or HTTP failure of a store load; prior state is kept
    #[error("Failed to load {resource}: {message}")]
    LoadFailed { resource: String, message: String },

    /// `select` or `load_one` against an id the server does not know
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    // ── Routing ──────────────────────────────────────────────────────
    #[error("No route matches path: {path}")]
    RouteUnmatched { path: String },

    // ── Translation ──────────────────────────────────────────────────
    #[error("Missing translation for '{key}' in locale '{locale}'")]
    TranslationMissing { key: String, locale: String },

    #[error("Invalid message catalog '{locale}': {message}")]
    Catalog { locale: String, message: String },

    // ── Startup ──────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

impl Error {
    pub fn load_failed(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn route_unmatched(path: impl Into<String>) -> Self {
        Self::RouteUnmatched { path: path.into() }
    }

    pub fn translation_missing(key: impl Into<String>, locale: impl Into<String>) -> Self {
        Self::TranslationMissing {
            key: key.into(),
            locale: locale.into(),
        }
    }

    pub fn catalog(locale: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Catalog {
            locale: locale.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    /// Raised while browsing and recovered as UI state (banner, placeholder,
    /// fallback route or fallback text).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::LoadFailed { .. }
                | Error::NotFound { .. }
                | Error::RouteUnmatched { .. }
                | Error::TranslationMissing { .. }
        )
    }

    /// The console cannot start.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Catalog { .. } | Error::ConfigInvalid { .. })
    }
}

/// Log an error with context on its way up.
///
/// Fatal errors log at `error`, everything else at `warn`; the error itself
/// passes through unchanged.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.with_context(|| context.into())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            if err.is_fatal() {
                tracing::error!("{}: {}", f(), err);
            } else {
                tracing::warn!("{}: {}", f(), err);
            }
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::load_failed("rack", "connection refused").to_string(),
            "Failed to load rack: connection refused"
        );
        assert_eq!(
            Error::not_found("device", "HX-42").to_string(),
            "device not found: HX-42"
        );
        assert!(Error::route_unmatched("/nowhere")
            .to_string()
            .contains("/nowhere"));
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_browsing_errors_are_recoverable_and_not_fatal() {
        let browsing = [
            Error::load_failed("rack", "timeout"),
            Error::not_found("rack", "1"),
            Error::route_unmatched("/x"),
            Error::translation_missing("Racks", "ko"),
        ];
        for err in &browsing {
            assert!(err.is_recoverable(), "{err}");
            assert!(!err.is_fatal(), "{err}");
        }
    }

    #[test]
    fn test_startup_errors_are_fatal() {
        assert!(Error::config_invalid("bad url").is_fatal());
        assert!(Error::catalog("ko", "bad plural table").is_fatal());
        assert!(!Error::config("could not write file").is_fatal());
    }

    #[test]
    fn test_context_passes_error_through() {
        let result: std::result::Result<(), Error> = Err(Error::config("missing base_url"));
        let err = result.context("loading settings").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
