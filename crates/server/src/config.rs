use std::time::Duration;

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Optional settings file looked up in the working directory
/// (`stacklink.toml`, or any other format `config` recognises).
pub const SETTINGS_FILE: &str = "stacklink";
pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub command_bind: String,
    pub dashboard_bind: String,
    pub layout_path: String,
    /// Seconds a command connection may stay silent; `0` disables the limit.
    pub idle_timeout_seconds: u64,
    pub snapshot_channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_bind: "0.0.0.0:7000".into(),
            dashboard_bind: "0.0.0.0:8000".into(),
            layout_path: "layouts/default.toml".into(),
            idle_timeout_seconds: 300,
            snapshot_channel_capacity: 64,
        }
    }
}

impl Settings {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_seconds > 0).then(|| Duration::from_secs(self.idle_timeout_seconds))
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(SETTINGS_FILE, ENV_PREFIX)
}

/// Defaults, then `file` if it exists, then `{prefix}__FIELD` variables.
pub fn load_settings_from(file: &str, prefix: &str) -> anyhow::Result<Settings> {
    let config = Config::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to read settings from '{file}'"))?;
    config
        .try_deserialize()
        .context("settings contain an invalid value")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
