//! Headless mode - JSON view output
//!
//! The console's view layer for scripts and tests. Every navigation that
//! settles produces one composed view description, printed to stdout as
//! NDJSON (newline-delimited JSON), one event per line. Each event has an
//! "event" field indicating its type.
//!
//! # Example Output
//!
//! ```json
//! {"event":"started","base_url":"http://localhost:5000/","locale":"en","timestamp":1704700001000}
//! {"event":"view","requested":"/rack/42","view":{"route":"rack-detail",...},"timestamp":1704700002000}
//! ```

pub mod runner;

use chrono::Utc;
use conch_app::ViewDescription;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Context built and language selected
    Started {
        base_url: String,
        locale: String,
        timestamp: i64,
    },

    /// A navigation settled and its view was composed
    View {
        /// Path as given, before redirects
        requested: String,
        view: Box<ViewDescription>,
        timestamp: i64,
    },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    pub fn started(base_url: &str, locale: &str) -> Self {
        Self::Started {
            base_url: base_url.to_owned(),
            locale: locale.to_owned(),
            timestamp: timestamp_ms(),
        }
    }

    pub fn view(requested: &str, view: ViewDescription) -> Self {
        Self::View {
            requested: requested.to_owned(),
            view: Box::new(view),
            timestamp: timestamp_ms(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: timestamp_ms(),
        }
    }

    /// Print this event as one stdout line.
    pub fn emit(&self) {
        let stdout = io::stdout();
        if let Err(e) = self.write_line(&mut stdout.lock()) {
            error!("Dropping headless event: {}", e);
        }
    }

    /// Write this event plus a newline to `out` and flush.
    pub fn write_line<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(json) = self.to_json() else {
            return Ok(());
        };
        writeln!(out, "{json}")?;
        out.flush()
    }

    /// Single-line JSON; `None` when serialization fails.
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self)
            .inspect_err(|e| error!("Cannot serialize headless event: {}", e))
            .ok()
    }
}

fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
