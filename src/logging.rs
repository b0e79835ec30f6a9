//! Tracing subscriber setup for the binary.
//!
//! The filter comes from `KEEPNOTE_LOG`, then `RUST_LOG`, then
//! [`DEFAULT_FILTER`]. The CLI logs to stderr. The TUI owns the terminal,
//! so it logs to a file instead.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_VAR: &str = "KEEPNOTE_LOG";
pub const DEFAULT_FILTER: &str = "warn";

/// Builds the log filter from the environment.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Sends log output to stderr.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Appends log output to the file at `path`, creating it if needed.
pub fn init_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
