//! Conch - operations console for rack, device and relay inventory
//!
//! This is the binary entry point. All logic lives in the library crates.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use conch_app::config::{init_config_dir, load_settings};
use conch_app::AppContext;
use conch_console::{run_headless, HeadlessEvent};
use tracing::{error, info};

/// Conch - operations console for rack, device and relay inventory
#[derive(Parser, Debug)]
#[command(name = "conch")]
#[command(about = "Browse inventory racks, devices, relays and problems", long_about = None)]
struct Args {
    /// Console paths to open, in order (e.g. /rack/42 /problem)
    #[arg(value_name = "PATH")]
    paths: Vec<String>,

    /// Inventory API base URL (overrides api.base_url)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Locale code (overrides ui.locale), e.g. "ko"
    #[arg(long, value_name = "CODE")]
    locale: Option<String>,

    /// Directory containing .conch/config.toml (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Write a default .conch/config.toml if none exists
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // Log to file; stdout carries the NDJSON stream
    conch_core::logging::init()?;

    let config_dir = args
        .config_dir
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if args.init {
        init_config_dir(&config_dir)?;
    }

    let settings = load_settings(&config_dir).with_overrides(args.api_url, args.locale);
    info!("Config directory: {}", config_dir.display());

    let ctx = match AppContext::connect(&settings) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!("Startup failed: {}", e);
            HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
            return Err(e.into());
        }
    };

    run_headless(ctx, &args.paths).await;
    Ok(())
}
