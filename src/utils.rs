//! Shared helpers for locating and opening the note store.
//!
//! These functions are reused across the CLI and TUI interfaces.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{Backend, Config};
use crate::store::{DocumentStore, LocalStore, NoteStore};

/// Gets the cross-platform data directory for keepnote.
///
/// Returns `{data_dir}/keepnote` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_data_directory() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("keepnote"))
}

/// Gets the store path for `config`, falling back to the default location
/// for its backend.
///
/// # Errors
///
/// Returns an error if no path is configured and the data directory cannot
/// be determined.
pub fn get_store_path(config: &Config) -> Result<PathBuf> {
    match &config.store_path {
        Some(path) => Ok(path.clone()),
        None => Ok(get_data_directory()?.join(config.backend.default_file_name())),
    }
}

/// Gets the path of the TUI log file.
pub fn get_log_path() -> Result<PathBuf> {
    Ok(get_data_directory()?.join("keepnote.log"))
}

/// Ensures the parent directory of the store file exists.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_store_directory(store_path: &Path) -> Result<()> {
    if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Opens the backend selected by `config`.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved or the store cannot be
/// opened.
pub fn open_store(config: &Config) -> Result<Box<dyn NoteStore>> {
    let path = get_store_path(config)?;
    ensure_store_directory(&path)?;
    tracing::debug!(backend = %config.backend, path = %path.display(), "opening store");

    let store: Box<dyn NoteStore> = match config.backend {
        Backend::Document => Box::new(
            DocumentStore::open(&path)
                .with_context(|| format!("Failed to open document store: {}", path.display()))?,
        ),
        Backend::Local => Box::new(
            LocalStore::open(&path)
                .with_context(|| format!("Failed to open local store: {}", path.display()))?,
        ),
    };
    Ok(store)
}

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty
/// strings.
///
/// # Examples
///
/// ```
/// use keepnote::utils::parse_tags;
///
/// let tags = parse_tags("rust, learning, ");
/// assert_eq!(tags, vec!["rust", "learning"]);
/// ```
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
