//! Display formatting shared by the view composer

use chrono::{DateTime, Utc};
use conch_i18n::Translator;

/// Render a timestamp relative to `now` ("3 minutes ago").
///
/// Uses the largest whole unit; timestamps in the future count as "just now".
pub fn relative_time(tr: &Translator, at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return tr.t("Never");
    };

    let seconds = (now - at).num_seconds();
    if seconds < 1 {
        return tr.t("just now");
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    if days > 0 {
        tr.tn("%n days ago", days)
    } else if hours > 0 {
        tr.tn("%n hours ago", hours)
    } else if minutes > 0 {
        tr.tn("%n minutes ago", minutes)
    } else {
        tr.tn("%n seconds ago", seconds)
    }
}

/// Device label used in tables: `alias (id)` when an alias is set.
pub fn device_label(id: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) if !alias.is_empty() && alias != id => format!("{} ({})", alias, id),
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use conch_i18n::{CatalogSet, Translator};

    fn en() -> Translator {
        Translator::new(&CatalogSet::builtin().unwrap(), &["en".to_string()]).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_never() {
        assert_eq!(relative_time(&en(), None, now()), "Never");
    }

    #[test]
    fn test_units() {
        let tr = en();
        let ago = |d: Duration| relative_time(&tr, Some(now() - d), now());
        assert_eq!(ago(Duration::zero()), "just now");
        assert_eq!(ago(Duration::seconds(1)), "a second ago");
        assert_eq!(ago(Duration::seconds(42)), "42 seconds ago");
        assert_eq!(ago(Duration::seconds(60)), "a minute ago");
        assert_eq!(ago(Duration::minutes(3)), "3 minutes ago");
        assert_eq!(ago(Duration::minutes(90)), "an hour ago");
        assert_eq!(ago(Duration::hours(5)), "5 hours ago");
        assert_eq!(ago(Duration::days(2)), "2 days ago");
    }

    #[test]
    fn test_future_is_just_now() {
        let tr = en();
        assert_eq!(
            relative_time(&tr, Some(now() + Duration::minutes(5)), now()),
            "just now"
        );
    }

    #[test]
    fn test_device_label() {
        assert_eq!(device_label("HX-1", None), "HX-1");
        assert_eq!(device_label("HX-1", Some("web01")), "web01 (HX-1)");
        assert_eq!(device_label("HX-1", Some("HX-1")), "HX-1");
    }
}
