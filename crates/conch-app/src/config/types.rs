//! Configuration types

use std::time::Duration;

use conch_core::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;

/// Locale setting value that defers to environment detection.
pub const AUTO_LOCALE: &str = "auto";

/// Console settings (.conch/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

impl Settings {
    /// Apply command-line overrides on top of the file settings.
    pub fn with_overrides(mut self, base_url: Option<String>, locale: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url;
        }
        if let Some(locale) = locale {
            self.ui.locale = locale;
        }
        self
    }
}

/// Inventory API settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout; expiry surfaces as a failed load
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Forward session cookies with every request
    #[serde(default = "default_true")]
    pub with_credentials: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            with_credentials: true,
        }
    }
}

impl ApiSettings {
    /// Parsed base URL. Only http(s) URLs that can take path segments are
    /// accepted.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            Error::config_invalid(format!("api.base_url {:?}: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(Error::config_invalid(format!(
                "api.base_url {:?} is not an http(s) URL",
                self.base_url
            )));
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UiSettings {
    /// Locale code, or "auto" to detect from the environment
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
        }
    }
}

impl UiSettings {
    /// Configured locale, or `None` when it should be detected.
    pub fn locale_override(&self) -> Option<&str> {
        let locale = self.locale.trim();
        if locale.is_empty() || locale.eq_ignore_ascii_case(AUTO_LOCALE) {
            None
        } else {
            Some(locale)
        }
    }
}

fn default_locale() -> String {
    AUTO_LOCALE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, "http://localhost:5000");
        assert_eq!(settings.api.timeout(), Duration::from_secs(30));
        assert!(settings.api.with_credentials);
        assert_eq!(settings.ui.locale_override(), None);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str("[ui]\nlocale = \"ko\"\n").unwrap();
        assert_eq!(settings.ui.locale_override(), Some("ko"));
        assert_eq!(settings.api, ApiSettings::default());
    }

    #[test]
    fn test_base_url_validation() {
        let mut api = ApiSettings::default();
        assert_eq!(api.base_url().unwrap().as_str(), "http://localhost:5000/");

        api.base_url = "not a url".into();
        assert!(matches!(api.base_url(), Err(Error::ConfigInvalid { .. })));

        api.base_url = "mailto:ops@example.com".into();
        assert!(api.base_url().unwrap_err().is_fatal());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default()
            .with_overrides(Some("https://inventory.example.com/api".into()), None);
        assert_eq!(settings.api.base_url, "https://inventory.example.com/api");
        assert_eq!(settings.ui.locale, AUTO_LOCALE);

        let settings = settings.with_overrides(None, Some("ko-KR".into()));
        assert_eq!(settings.ui.locale_override(), Some("ko-KR"));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let api = ApiSettings {
            timeout_secs: 0,
            ..ApiSettings::default()
        };
        assert_eq!(api.timeout(), Duration::from_secs(1));
    }
}
