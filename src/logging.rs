//! File logging.
//!
//! The terminal belongs to the renderer, so `tracing` output goes to
//! `gridsnake.log` in the data directory.

use crate::core::constants::LOG_FILE_NAME;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns false (and logs nothing) if the
/// log file can't be opened or a subscriber is already installed.
pub fn init(dir: &Path, filter: &str) -> bool {
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
    {
        Ok(file) => file,
        Err(_) => return false,
    };

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .is_ok()
}
