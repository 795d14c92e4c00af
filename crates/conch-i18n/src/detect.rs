//! Locale preference detection and matching

use std::env;

/// Supplies the user's preferred locale identifiers, most preferred first.
///
/// Detection never fails: an unavailable or unreadable preference source is
/// reported as an empty list.
pub trait LocaleDetector {
    fn preferred_locales(&self) -> Vec<String>;
}

/// Reads `LANGUAGE`, `LC_ALL`, `LC_MESSAGES` and `LANG`, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLocaleDetector;

impl LocaleDetector for EnvLocaleDetector {
    fn preferred_locales(&self) -> Vec<String> {
        let mut found = Vec::new();

        // GNU LANGUAGE is a colon separated priority list
        if let Ok(list) = env::var("LANGUAGE") {
            found.extend(list.split(':').filter_map(normalize_locale));
        }

        for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
            if let Some(locale) = env::var(var).ok().as_deref().and_then(normalize_locale) {
                found.push(locale);
            }
        }

        found.dedup();
        found
    }
}

/// A fixed preference list, used for configuration and CLI overrides.
#[derive(Debug, Clone, Default)]
pub struct FixedLocale(pub Vec<String>);

impl FixedLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(vec![locale.into()])
    }
}

impl LocaleDetector for FixedLocale {
    fn preferred_locales(&self) -> Vec<String> {
        self.0.iter().filter_map(|l| normalize_locale(l)).collect()
    }
}

/// Normalize a POSIX or BCP 47 locale string to `lang[-REGION]`.
///
/// `ko_KR.UTF-8` becomes `ko-KR`, `en_US@euro` becomes `en-US`. `C`, `POSIX`
/// and empty strings carry no preference and return `None`.
pub fn normalize_locale(raw: &str) -> Option<String> {
    let base = raw
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base.eq_ignore_ascii_case("C") || base.eq_ignore_ascii_case("POSIX") {
        return None;
    }

    let mut parts = base.split(['_', '-']);
    let language = parts.next()?.to_ascii_lowercase();
    if language.is_empty() {
        return None;
    }
    match parts.next().filter(|region| !region.is_empty()) {
        Some(region) => Some(format!("{}-{}", language, region.to_ascii_uppercase())),
        None => Some(language),
    }
}

/// Primary language subtag of a normalized locale (`ko-KR` -> `ko`).
pub fn primary_language(locale: &str) -> &str {
    locale.split('-').next().unwrap_or(locale)
}

/// Pick the first supported locale matching the preference list.
///
/// Each preference is tried as an exact (case-insensitive) match, then by its
/// primary language, before moving on to the next preference. Falls back to
/// `default` when nothing matches.
pub fn select_locale(supported: &[String], preferences: &[String], default: &str) -> String {
    for preference in preferences {
        if let Some(exact) = supported
            .iter()
            .find(|code| code.eq_ignore_ascii_case(preference))
        {
            return exact.clone();
        }

        let language = primary_language(preference);
        if let Some(base) = supported
            .iter()
            .find(|code| code.eq_ignore_ascii_case(language))
        {
            return base.clone();
        }
    }

    default.to_string()
}
