//! Parsing and validation helpers for configuration values.

use std::time::Duration;

use crate::defaults::MAX_LINK_RESOLVE_TIMEOUT;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{BrokerConfig, LogFormatSetting};

/// Validate a fully layered configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first field that fails.
pub fn validate(config: &BrokerConfig) -> ConfigResult<()> {
    if config.endpoint.trim().is_empty() {
        return Err(ConfigError::invalid("endpoint", "empty", config.endpoint.clone()));
    }
    if let Some(dir) = &config.recycle_dir
        && !dir.is_absolute()
    {
        return Err(ConfigError::invalid("recycle_dir", "not_absolute", dir.to_string_lossy()));
    }
    validate_timeout(config.link_resolve_timeout)?;
    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::invalid("logging.level", "empty", config.logging.level.clone()));
    }
    Ok(())
}

pub(crate) fn validate_timeout(timeout: Duration) -> ConfigResult<()> {
    if timeout.is_zero() {
        return Err(ConfigError::invalid("link_resolve_timeout_ms", "zero", "0"));
    }
    if timeout > MAX_LINK_RESOLVE_TIMEOUT {
        return Err(ConfigError::invalid(
            "link_resolve_timeout_ms",
            "too_large",
            timeout.as_millis().to_string(),
        ));
    }
    Ok(())
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_bool(field: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, "not_bool", raw)),
    }
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_millis(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::invalid(field, "not_integer", raw))
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_log_format(field: &'static str, raw: &str) -> ConfigResult<LogFormatSetting> {
    LogFormatSetting::parse(raw).ok_or_else(|| ConfigError::invalid(field, "unknown_format", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::model::LoggingSettings;

    fn sample() -> BrokerConfig {
        BrokerConfig {
            endpoint: "/tmp/broker.sock".to_string(),
            recycle_dir: Some(PathBuf::from("/tmp/trash")),
            link_resolve_timeout: Duration::from_millis(100),
            acknowledge_link_writes: false,
            logging: LoggingSettings {
                level: "info".to_string(),
                format: LogFormatSetting::Auto,
            },
        }
    }

    fn invalid_field(err: ConfigError) -> (&'static str, &'static str) {
        match err {
            ConfigError::InvalidField { field, reason, .. } => (field, reason),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn accepts_sample_configuration() {
        assert!(validate(&sample()).is_ok());
    }

    #[test]
    fn rejects_empty_endpoint() {
        let mut config = sample();
        config.endpoint = "  ".to_string();
        let err = validate(&config).expect_err("empty endpoint");
        assert_eq!(invalid_field(err), ("endpoint", "empty"));
    }

    #[test]
    fn rejects_relative_recycle_dir() {
        let mut config = sample();
        config.recycle_dir = Some(PathBuf::from("trash"));
        let err = validate(&config).expect_err("relative recycle dir");
        assert_eq!(invalid_field(err), ("recycle_dir", "not_absolute"));
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        let mut config = sample();
        config.link_resolve_timeout = Duration::ZERO;
        let err = validate(&config).expect_err("zero timeout");
        assert_eq!(invalid_field(err), ("link_resolve_timeout_ms", "zero"));

        config.link_resolve_timeout = Duration::from_secs(11);
        let err = validate(&config).expect_err("large timeout");
        assert_eq!(invalid_field(err), ("link_resolve_timeout_ms", "too_large"));

        config.link_resolve_timeout = MAX_LINK_RESOLVE_TIMEOUT;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn parses_boolean_spellings() {
        assert!(parse_bool("flag", "Yes").expect("yes"));
        assert!(!parse_bool("flag", "0").expect("zero"));
        let err = parse_bool("flag", "maybe").expect_err("maybe");
        assert_eq!(invalid_field(err), ("flag", "not_bool"));
    }

    #[test]
    fn parses_millis_and_formats() {
        assert_eq!(
            parse_millis("timeout", " 250 ").expect("millis"),
            Duration::from_millis(250)
        );
        assert!(parse_millis("timeout", "soon").is_err());
        assert_eq!(
            parse_log_format("format", "JSON").expect("json"),
            LogFormatSetting::Json
        );
        let err = parse_log_format("format", "xml").expect_err("xml");
        assert_eq!(invalid_field(err), ("format", "unknown_format"));
    }
}
