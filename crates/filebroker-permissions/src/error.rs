//! # Design
//!
//! - Constant messages; the object path and offending identity travel as fields.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for permission operations.
pub type PermissionsResult<T> = Result<T, PermissionsError>;

/// Errors raised by permission backends.
#[derive(Debug, Error)]
pub enum PermissionsError {
    /// IO failures while reading or changing access-control state.
    #[error("permissions io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Object path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An identity string could not be parsed or mapped.
    #[error("unrecognised security identifier")]
    InvalidSid {
        /// Operation that received the identifier.
        operation: &'static str,
        /// Offending identifier.
        sid: String,
    },
    /// The backend cannot express the requested change.
    #[error("permission change not supported")]
    Unsupported {
        /// Operation that was refused.
        operation: &'static str,
    },
    /// The blocking worker running the change went away.
    #[error("permissions worker failed")]
    Worker {
        /// Operation that was running.
        operation: &'static str,
    },
}

impl PermissionsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_sid(operation: &'static str, sid: impl Into<String>) -> Self {
        Self::InvalidSid {
            operation,
            sid: sid.into(),
        }
    }
}
