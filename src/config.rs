//! Runtime configuration read from the environment.
//!
//! # Environment Variables
//!
//! - `KEEPNOTE_BACKEND` (`document` or `local`, default `document`)
//! - `KEEPNOTE_STORE` (path, default under the user data directory)
//! - `KEEPNOTE_OWNER` (owner ID used when `--owner` is not given)
//! - `KEEPNOTE_SEARCH_CATEGORY` (bool, default false): also match the search
//!   query against note categories
//!
//! Command-line flags take precedence over all of these.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::OwnerId;
use crate::pipeline::SearchOptions;

pub const BACKEND_VAR: &str = "KEEPNOTE_BACKEND";
pub const STORE_VAR: &str = "KEEPNOTE_STORE";
pub const OWNER_VAR: &str = "KEEPNOTE_OWNER";
pub const SEARCH_CATEGORY_VAR: &str = "KEEPNOTE_SEARCH_CATEGORY";

/// Which [`NoteStore`](crate::NoteStore) implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// SQLite document store.
    #[default]
    Document,
    /// JSON file store.
    Local,
}

impl Backend {
    /// File name used when no store path is configured.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Document => "notes.db",
            Self::Local => "notes.json",
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "document" | "sqlite" => Ok(Self::Document),
            "local" | "json" => Ok(Self::Local),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Resolved settings for one run of the binary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub backend: Backend,
    /// Explicit store location; `None` means the per-user default.
    pub store_path: Option<PathBuf>,
    pub owner: Option<OwnerId>,
    pub search: SearchOptions,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// Falls back to defaults when variables are unset or invalid.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use keepnote::config::{Backend, Config};
    ///
    /// let config = Config::from_lookup(|key| match key {
    ///     "KEEPNOTE_BACKEND" => Some("local".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.backend, Backend::Local);
    /// assert!(config.owner.is_none());
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend = lookup(BACKEND_VAR)
            .and_then(|value| {
                value
                    .parse()
                    .map_err(|err| tracing::warn!(%err, "ignoring {BACKEND_VAR}"))
                    .ok()
            })
            .unwrap_or_default();

        let store_path = lookup(STORE_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let owner = lookup(OWNER_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(OwnerId::new);

        let match_category = lookup(SEARCH_CATEGORY_VAR)
            .and_then(|value| parse_flag(&value))
            .unwrap_or(false);

        Self {
            backend,
            store_path,
            owner,
            search: SearchOptions { match_category },
        }
    }

    /// Replaces settings with the ones given on the command line.
    pub fn with_overrides(
        mut self,
        backend: Option<Backend>,
        store_path: Option<PathBuf>,
        owner: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.backend = backend;
        }
        if let Some(path) = store_path {
            self.store_path = Some(path);
        }
        if let Some(owner) = owner.filter(|o| !o.trim().is_empty()) {
            self.owner = Some(OwnerId::new(owner.trim()));
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, Backend::Document);
        assert!(!config.search.match_category);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(vars(&[
            (BACKEND_VAR, "json"),
            (STORE_VAR, "/tmp/notes.json"),
            (OWNER_VAR, " alice "),
            (SEARCH_CATEGORY_VAR, "yes"),
        ]));

        assert_eq!(config.backend, Backend::Local);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/notes.json")));
        assert_eq!(config.owner, Some(OwnerId::new("alice")));
        assert!(config.search.match_category);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = Config::from_lookup(vars(&[
            (BACKEND_VAR, "firestore"),
            (STORE_VAR, "  "),
            (OWNER_VAR, ""),
            (SEARCH_CATEGORY_VAR, "maybe"),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides_take_precedence() {
        let config = Config::from_lookup(vars(&[(BACKEND_VAR, "local"), (OWNER_VAR, "alice")]))
            .with_overrides(
                Some(Backend::Document),
                Some(PathBuf::from("custom.db")),
                Some("bob".to_string()),
            );

        assert_eq!(config.backend, Backend::Document);
        assert_eq!(config.store_path, Some(PathBuf::from("custom.db")));
        assert_eq!(config.owner, Some(OwnerId::new("bob")));
    }

    #[test]
    fn absent_overrides_keep_environment_values() {
        let config =
            Config::from_lookup(vars(&[(OWNER_VAR, "alice")])).with_overrides(None, None, None);
        assert_eq!(config.owner, Some(OwnerId::new("alice")));
    }

    #[test]
    fn backend_default_file_names() {
        assert_eq!(Backend::Document.default_file_name(), "notes.db");
        assert_eq!(Backend::Local.default_file_name(), "notes.json");
        assert_eq!(Backend::Local.to_string(), "local");
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        // SAFETY: serialized with every other test that touches the environment
        unsafe {
            std::env::set_var(BACKEND_VAR, "local");
            std::env::set_var(OWNER_VAR, "env-owner");
        }

        let config = Config::from_env();

        unsafe {
            std::env::remove_var(BACKEND_VAR);
            std::env::remove_var(OWNER_VAR);
        }

        assert_eq!(config.backend, Backend::Local);
        assert_eq!(config.owner, Some(OwnerId::new("env-owner")));
    }

    #[test]
    #[serial]
    fn from_env_without_variables_uses_defaults() {
        unsafe {
            std::env::remove_var(BACKEND_VAR);
            std::env::remove_var(STORE_VAR);
            std::env::remove_var(OWNER_VAR);
            std::env::remove_var(SEARCH_CATEGORY_VAR);
        }
        assert_eq!(Config::from_env(), Config::default());
    }
}
