//! Layered configuration loader.
//!
//! # Design
//! - Layers apply in a fixed order: defaults, optional JSON file, `FILEBROKER_*`
//!   environment variables, then explicit overrides from the command line.
//! - Environment access goes through a lookup closure so tests never mutate the
//!   process environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{BrokerConfig, ConfigFile, LogFormatSetting};
use crate::validate::{self, parse_bool, parse_log_format, parse_millis};

/// Path of a JSON configuration file.
pub const ENV_CONFIG: &str = "FILEBROKER_CONFIG";
/// Transport endpoint override.
pub const ENV_ENDPOINT: &str = "FILEBROKER_ENDPOINT";
/// Staging directory for recycled items instead of the OS recycle bin.
pub const ENV_RECYCLE_DIR: &str = "FILEBROKER_RECYCLE_DIR";
/// Shortcut resolution bound in milliseconds.
pub const ENV_LINK_TIMEOUT_MS: &str = "FILEBROKER_LINK_TIMEOUT_MS";
/// Acknowledge link writes.
pub const ENV_ACK_LINK_WRITES: &str = "FILEBROKER_ACK_LINK_WRITES";
/// Log filter override.
pub const ENV_LOG_LEVEL: &str = "FILEBROKER_LOG_LEVEL";
/// Log format override.
pub const ENV_LOG_FORMAT: &str = "FILEBROKER_LOG_FORMAT";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Values supplied explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Endpoint to listen on.
    pub endpoint: Option<String>,
    /// Log filter.
    pub log_level: Option<String>,
    /// Log format.
    pub log_format: Option<LogFormatSetting>,
}

/// Builds a [`BrokerConfig`] from the configured layers.
pub struct ConfigLoader {
    env: EnvLookup,
    file: Option<PathBuf>,
    overrides: Overrides,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("file", &self.file)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Box::new(|key| std::env::var(key).ok()),
            file: None,
            overrides: Overrides::default(),
        }
    }

    /// Replace the environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    /// Read this file instead of the one named by `FILEBROKER_CONFIG`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Apply command-line overrides as the final layer.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Produce the validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed, when an
    /// environment value does not parse, or when validation fails.
    pub fn load(&self) -> ConfigResult<BrokerConfig> {
        let mut config = defaults::broker_config(&*self.env);

        let file = self
            .file
            .clone()
            .or_else(|| self.lookup(ENV_CONFIG).map(PathBuf::from));
        if let Some(path) = file {
            apply_file(&mut config, read_file(&path)?);
            debug!(path = %path.display(), "applied configuration file");
        }

        self.apply_env(&mut config)?;
        self.apply_overrides(&mut config);
        validate::validate(&config)?;
        Ok(config)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|value| !value.trim().is_empty())
    }

    fn apply_env(&self, config: &mut BrokerConfig) -> ConfigResult<()> {
        if let Some(endpoint) = self.lookup(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(dir) = self.lookup(ENV_RECYCLE_DIR) {
            config.recycle_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = self.lookup(ENV_LINK_TIMEOUT_MS) {
            config.link_resolve_timeout = parse_millis(ENV_LINK_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = self.lookup(ENV_ACK_LINK_WRITES) {
            config.acknowledge_link_writes = parse_bool(ENV_ACK_LINK_WRITES, &raw)?;
        }
        if let Some(level) = self.lookup(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }
        if let Some(raw) = self.lookup(ENV_LOG_FORMAT) {
            config.logging.format = parse_log_format(ENV_LOG_FORMAT, &raw)?;
        }
        Ok(())
    }

    fn apply_overrides(&self, config: &mut BrokerConfig) {
        if let Some(endpoint) = &self.overrides.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(level) = &self.overrides.log_level {
            config.logging.level.clone_from(level);
        }
        if let Some(format) = self.overrides.log_format {
            config.logging.format = format;
        }
    }
}

fn read_file(path: &Path) -> ConfigResult<ConfigFile> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_file(config: &mut BrokerConfig, file: ConfigFile) {
    if let Some(endpoint) = file.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(dir) = file.recycle_dir {
        config.recycle_dir = Some(dir);
    }
    if let Some(ms) = file.link_resolve_timeout_ms {
        config.link_resolve_timeout = std::time::Duration::from_millis(ms);
    }
    if let Some(ack) = file.acknowledge_link_writes {
        config.acknowledge_link_writes = ack;
    }
    if let Some(level) = file.logging.level {
        config.logging.level = level;
    }
    if let Some(format) = file.logging.format {
        config.logging.format = format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_load_without_file_or_env() {
        let config = ConfigLoader::new()
            .with_env(env_from(&[("HOME", "/home/u")]))
            .load()
            .expect("defaults are valid");
        assert_eq!(config.link_resolve_timeout, defaults::LINK_RESOLVE_TIMEOUT);
        assert!(!config.acknowledge_link_writes);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormatSetting::Auto);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ConfigLoader::new()
            .with_env(env_from(&[
                ("HOME", "/home/u"),
                (ENV_ENDPOINT, "/run/broker.sock"),
                (ENV_RECYCLE_DIR, "/srv/trash"),
                (ENV_LINK_TIMEOUT_MS, "250"),
                (ENV_ACK_LINK_WRITES, "true"),
                (ENV_LOG_LEVEL, "debug"),
                (ENV_LOG_FORMAT, "json"),
            ]))
            .load()
            .expect("env config valid");
        assert_eq!(config.endpoint, "/run/broker.sock");
        assert_eq!(config.recycle_dir, Some(PathBuf::from("/srv/trash")));
        assert_eq!(config.link_resolve_timeout, Duration::from_millis(250));
        assert!(config.acknowledge_link_writes);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormatSetting::Json);
    }

    #[test]
    fn overrides_win_over_environment() {
        let config = ConfigLoader::new()
            .with_env(env_from(&[
                ("HOME", "/home/u"),
                (ENV_ENDPOINT, "/run/env.sock"),
                (ENV_LOG_FORMAT, "json"),
            ]))
            .with_overrides(Overrides {
                endpoint: Some("/run/cli.sock".to_string()),
                log_level: Some("trace".to_string()),
                log_format: Some(LogFormatSetting::Pretty),
            })
            .load()
            .expect("override config valid");
        assert_eq!(config.endpoint, "/run/cli.sock");
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, LogFormatSetting::Pretty);
    }

    #[test]
    fn invalid_environment_value_is_reported() {
        let err = ConfigLoader::new()
            .with_env(env_from(&[("HOME", "/home/u"), (ENV_LOG_FORMAT, "xml")]))
            .load()
            .expect_err("unknown format");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: ENV_LOG_FORMAT,
                reason: "unknown_format",
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_from_environment_fails_validation() {
        let err = ConfigLoader::new()
            .with_env(env_from(&[("HOME", "/home/u"), (ENV_LINK_TIMEOUT_MS, "0")]))
            .load()
            .expect_err("zero timeout");
        assert!(matches!(err, ConfigError::InvalidField { reason: "zero", .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ConfigLoader::new()
            .with_env(env_from(&[("HOME", "/home/u")]))
            .with_file("/nonexistent/filebroker.json")
            .load()
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
