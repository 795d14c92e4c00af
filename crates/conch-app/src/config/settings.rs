//! Settings parser for .conch/config.toml

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use conch_core::prelude::*;

use super::types::Settings;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const CONCH_DIR: &str = ".conch";

/// Commented template written by [`init_config_dir`]; parses to
/// `Settings::default()`.
const DEFAULT_CONFIG: &str = r#"# Conch Console Configuration

[api]
base_url = "http://localhost:5000"   # Inventory API root
timeout_secs = 30                    # Per-request timeout
with_credentials = true              # Forward session cookies

[ui]
locale = "auto"                      # "auto" detects from LANG; or e.g. "ko"
"#;

/// Path of the config file for a project directory.
pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(CONCH_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.conch/config.toml` under `project_path`.
///
/// A missing file yields defaults quietly; an unreadable or unparsable one
/// yields defaults with a warning. Values are validated later, when the
/// context is built.
pub fn load_settings(project_path: &Path) -> Settings {
    let path = config_path(project_path);
    read_settings(&path).unwrap_or_default()
}

fn read_settings(path: &Path) -> Option<Settings> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config file at {}, using defaults", path.display());
            return None;
        }
        Err(e) => {
            warn!("Cannot read {}: {}; using defaults", path.display(), e);
            return None;
        }
    };

    toml::from_str::<Settings>(&content)
        .inspect(|_| debug!("Settings loaded from {}", path.display()))
        .inspect_err(|e| warn!("Ignoring {}: {}", path.display(), e))
        .ok()
}

/// Write the default `.conch/config.toml`. An existing file is left alone.
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let path = config_path(project_path);
    if path.exists() {
        debug!("Keeping existing {}", path.display());
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::config(format!("cannot create {}: {}", dir.display(), e))
        })?;
    }
    std::fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| Error::config(format!("cannot write {}: {}", path.display(), e)))?;

    info!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = tempdir().unwrap();
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(CONCH_DIR)).unwrap();

        let config = r#"
[api]
base_url = "https://inventory.example.com"
with_credentials = false

[ui]
locale = "ko"
"#;
        std::fs::write(config_path(temp.path()), config).unwrap();
        let settings = load_settings(temp.path());

        assert_eq!(settings.api.base_url, "https://inventory.example.com");
        assert!(!settings.api.with_credentials);
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.ui.locale_override(), Some("ko"));
    }

    #[test]
    fn test_unparsable_file_gives_defaults() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(CONCH_DIR)).unwrap();
        std::fs::write(config_path(temp.path()), "[api\nbase_url = ").unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_written_template_matches_defaults() {
        let temp = tempdir().unwrap();
        init_config_dir(temp.path()).unwrap();

        assert!(temp.path().join(".conch/config.toml").is_file());
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let temp = tempdir().unwrap();
        init_config_dir(temp.path()).unwrap();
        std::fs::write(config_path(temp.path()), "[ui]\nlocale = \"ko\"\n").unwrap();

        init_config_dir(temp.path()).unwrap();
        assert_eq!(load_settings(temp.path()).ui.locale_override(), Some("ko"));
    }
}
