//! Platform defaults for the configuration layers.
//!
//! # Design
//! - Defaults derive from the same environment lookup the loader uses, so tests
//!   can pin them without touching the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::model::{BrokerConfig, LogFormatSetting, LoggingSettings};

/// Default bound for shortcut target resolution.
pub const LINK_RESOLVE_TIMEOUT: Duration = Duration::from_millis(100);
/// Largest accepted shortcut resolution bound.
pub const MAX_LINK_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default log filter.
pub const LOG_LEVEL: &str = "info";

#[cfg(windows)]
const PIPE_NAME: &str = r"\\.\pipe\filebroker";
#[cfg(not(windows))]
const SOCKET_NAME: &str = "filebroker.sock";

pub(crate) fn broker_config(env: &dyn Fn(&str) -> Option<String>) -> BrokerConfig {
    BrokerConfig {
        endpoint: endpoint(env),
        recycle_dir: None,
        link_resolve_timeout: LINK_RESOLVE_TIMEOUT,
        acknowledge_link_writes: false,
        logging: LoggingSettings {
            level: LOG_LEVEL.to_string(),
            format: LogFormatSetting::Auto,
        },
    }
}

#[cfg(windows)]
fn endpoint(_env: &dyn Fn(&str) -> Option<String>) -> String {
    PIPE_NAME.to_string()
}

#[cfg(not(windows))]
fn endpoint(env: &dyn Fn(&str) -> Option<String>) -> String {
    let runtime_dir = non_empty(env, "XDG_RUNTIME_DIR")
        .map_or_else(std::env::temp_dir, PathBuf::from);
    runtime_dir.join(SOCKET_NAME).to_string_lossy().into_owned()
}

fn non_empty(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn runtime_dir_hosts_the_socket() {
        let env = |key: &str| match key {
            "XDG_RUNTIME_DIR" => Some("/run/user/1000".to_string()),
            "HOME" => Some("/home/u".to_string()),
            _ => None,
        };
        let config = broker_config(&env);
        assert_eq!(config.endpoint, "/run/user/1000/filebroker.sock");
        assert_eq!(config.link_resolve_timeout, LINK_RESOLVE_TIMEOUT);
    }

    #[test]
    fn deletes_use_the_system_recycle_bin_by_default() {
        let config = broker_config(&|_: &str| -> Option<String> { None });
        assert!(config.recycle_dir.is_none());
        assert!(config.endpoint.ends_with("filebroker.sock"));
    }
}
