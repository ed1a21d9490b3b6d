//! # Design
//!
//! - Centralize application-level errors for bootstrap, dispatch and transport.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: filebroker_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: filebroker_telemetry::TelemetryError,
    },
    /// Filesystem operations failed outside the expected per-item outcomes.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: filebroker_fsops::FsOpsError,
    },
    /// Encoding a response payload failed.
    #[error("response encoding failed")]
    Encode {
        /// Operation identifier.
        operation: &'static str,
        /// Source serializer error.
        source: serde_json::Error,
    },
    /// Listening on or accepting from the endpoint failed.
    #[error("transport operation failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Endpoint involved.
        endpoint: String,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: filebroker_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: filebroker_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: filebroker_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) fn transport(operation: &'static str, endpoint: &str, source: io::Error) -> Self {
        Self::Transport {
            operation,
            endpoint: endpoint.to_string(),
            source,
        }
    }
}
