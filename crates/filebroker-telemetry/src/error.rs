//! Telemetry error type.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use prometheus::Error as PrometheusError;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Step of collector setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStage {
    /// Constructing the collector from its options.
    Build,
    /// Adding the collector to the registry.
    Register,
}

/// Errors raised while setting up logging or metrics.
#[derive(Debug)]
pub enum TelemetryError {
    /// The log filter directive did not parse.
    InvalidFilter {
        /// Directive as configured or taken from `RUST_LOG`.
        directive: String,
        /// Parser error.
        source: ParseError,
    },
    /// A global subscriber was already installed.
    SubscriberInstall {
        /// Installation error.
        source: TryInitError,
    },
    /// A Prometheus collector could not be set up.
    Collector {
        /// Metric name.
        name: &'static str,
        /// Step that failed.
        stage: CollectorStage,
        /// Prometheus error.
        source: PrometheusError,
    },
    /// The text exposition could not be encoded.
    Render {
        /// Prometheus error.
        source: PrometheusError,
    },
    /// The text exposition was not UTF-8.
    RenderUtf8 {
        /// Conversion error.
        source: std::string::FromUtf8Error,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::InvalidFilter { .. } => "invalid log filter",
            Self::SubscriberInstall { .. } => "tracing subscriber already installed",
            Self::Collector { .. } => "metrics collector setup failed",
            Self::Render { .. } => "metrics rendering failed",
            Self::RenderUtf8 { .. } => "metrics rendering produced invalid utf-8",
        })
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFilter { source, .. } => Some(source),
            Self::SubscriberInstall { source } => Some(source),
            Self::Collector { source, .. } | Self::Render { source } => Some(source),
            Self::RenderUtf8 { source } => Some(source),
        }
    }
}
