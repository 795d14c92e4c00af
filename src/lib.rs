//! Conch Console Library
//!
//! The `conch` binary's headless view layer: it drives an
//! [`conch_app::AppContext`] through a list of paths and prints each composed
//! view as NDJSON.

pub mod headless;

pub use headless::runner::{for_each_view, render_paths, run_headless};
pub use headless::HeadlessEvent;
