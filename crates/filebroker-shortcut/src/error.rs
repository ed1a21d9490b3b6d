//! # Design
//!
//! - Constant-message errors for shortcut decoding and writing.
//! - Structural failures name the structure and byte offset; IO failures keep the path.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for shortcut operations.
pub type ShortcutResult<T> = Result<T, ShortcutError>;

/// Errors raised while reading or writing shortcuts.
#[derive(Debug, Error)]
pub enum ShortcutError {
    /// IO failures while touching the shortcut file.
    #[error("shortcut io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Shortcut path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Data ended before a structure was complete.
    #[error("shell link truncated")]
    Truncated {
        /// Structure being read.
        structure: &'static str,
        /// Byte offset where data ran out.
        offset: usize,
    },
    /// A fixed header field held an unexpected value.
    #[error("invalid shell link header")]
    InvalidHeader {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value.
        value: u64,
    },
    /// The file extension is not a supported shortcut type.
    #[error("unsupported shortcut extension")]
    UnsupportedExtension {
        /// Path with the unsupported extension.
        path: PathBuf,
    },
    /// An internet shortcut carried no URL.
    #[error("internet shortcut missing url")]
    MissingUrl {
        /// Shortcut path.
        path: PathBuf,
    },
}

impl ShortcutError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
