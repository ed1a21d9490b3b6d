//! Typed configuration models.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Effective broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Local socket path (Unix) or pipe name (Windows) the transport listens on.
    pub endpoint: String,
    /// Staging directory for non-permanent deletes; `None` uses the OS recycle bin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle_dir: Option<PathBuf>,
    /// Upper bound for resolving a shortcut target while parsing links.
    #[serde(rename = "link_resolve_timeout_ms", with = "duration_ms")]
    pub link_resolve_timeout: Duration,
    /// Answer `CreateLink`/`UpdateLink` with a `Success` flag instead of staying silent.
    pub acknowledge_link_writes: bool,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormatSetting,
}

/// Configured log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormatSetting {
    /// Pretty in debug builds, JSON in release builds.
    Auto,
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormatSetting {
    /// Configuration spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }

    /// Parse the configuration spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Partial configuration read from a JSON file; absent keys keep earlier layers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub(crate) endpoint: Option<String>,
    pub(crate) recycle_dir: Option<PathBuf>,
    pub(crate) link_resolve_timeout_ms: Option<u64>,
    pub(crate) acknowledge_link_writes: Option<bool>,
    #[serde(default)]
    pub(crate) logging: LoggingFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LoggingFile {
    pub(crate) level: Option<String>,
    pub(crate) format: Option<LogFormatSetting>,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
