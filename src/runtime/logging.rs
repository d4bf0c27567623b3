//! File-backed tracing subscriber.
//!
//! The TUI owns the terminal, so log lines go to `somna.log` under the XDG
//! state directory. `SOMNA_LOG` takes an `EnvFilter` directive string.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::default_log_path;

const DEFAULT_FILTER: &str = "somna=info";

/// Install the global subscriber. Logging stays off when the log file
/// cannot be opened.
pub fn init() {
    let Some(path) = default_log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter =
        EnvFilter::try_from_env("SOMNA_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init();
}
