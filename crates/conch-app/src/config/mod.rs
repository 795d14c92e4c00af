//! Configuration file parsing for the Conch console
//!
//! Supports:
//! - `.conch/config.toml` - API endpoint and UI settings

pub mod settings;
pub mod types;

pub use settings::{config_path, init_config_dir, load_settings, CONCH_DIR, CONFIG_FILENAME};
pub use types::*;
