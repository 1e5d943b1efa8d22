//! Runtime configuration.
//!
//! Loaded from `config.json` in the data directory, then overridden by
//! `GRIDSNAKE_*` environment variables.

use crate::core::constants::{CONFIG_KEY, DEFAULT_REMOTE_TABLE};
use crate::utils::persistence::Store;
use serde::{Deserialize, Serialize};

pub const ENV_REMOTE_URL: &str = "GRIDSNAKE_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "GRIDSNAKE_REMOTE_KEY";
pub const ENV_REMOTE_TABLE: &str = "GRIDSNAKE_REMOTE_TABLE";
pub const ENV_DATA_DIR: &str = "GRIDSNAKE_DATA_DIR";
pub const ENV_LOG: &str = "GRIDSNAKE_LOG";
pub const ENV_SOUND: &str = "GRIDSNAKE_SOUND";

/// Hosted leaderboard table settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: DEFAULT_REMOTE_TABLE.to_string(),
        }
    }
}

impl RemoteConfig {
    /// Both URL and key are required; anything less runs local-only.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    /// `tracing` filter directive for the log file.
    pub log_filter: String,
    pub sound: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            log_filter: "info".to_string(),
            sound: true,
        }
    }
}

impl AppConfig {
    /// Load from the store and apply process environment overrides.
    pub fn load(store: &Store) -> Self {
        let mut config: AppConfig = store.load_or_default(CONFIG_KEY);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_REMOTE_URL) {
            self.remote.url = url;
        }
        if let Some(key) = get(ENV_REMOTE_KEY) {
            self.remote.api_key = key;
        }
        if let Some(table) = get(ENV_REMOTE_TABLE) {
            self.remote.table = table;
        }
        if let Some(filter) = get(ENV_LOG) {
            self.log_filter = filter;
        }
        if let Some(sound) = get(ENV_SOUND) {
            self.sound = !matches!(sound.as_str(), "0" | "false" | "off" | "FALSE" | "OFF");
        }
    }

    /// Drop the remote backend (`--offline`).
    pub fn offline(mut self) -> Self {
        self.remote.url.clear();
        self.remote.api_key.clear();
        self
    }
}
