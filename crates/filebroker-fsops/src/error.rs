//! # Design
//!
//! - Provide structured, constant-message errors for shell operations.
//! - Capture operation context (paths, fields, kinds) instead of interpolating it.
//! - Per-item failures are not errors; they travel as [`crate::FailureCode`] on item events.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::OperationKind;

/// Result type for shell operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced outside per-item execution.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An item of another kind was queued on a homogeneous batch.
    #[error("batch operation kind mismatch")]
    KindMismatch {
        /// Kind the batch was created with.
        expected: OperationKind,
        /// Kind of the rejected item.
        found: OperationKind,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Operation that rejected the input.
        operation: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The apartment worker thread is gone.
    #[error("apartment worker unavailable")]
    WorkerUnavailable {
        /// Operation that was being scheduled.
        operation: &'static str,
    },
    /// A job panicked on the apartment worker.
    #[error("apartment job panicked")]
    WorkerPanicked {
        /// Operation whose job panicked.
        operation: &'static str,
    },
    /// The clipboard store lock was poisoned.
    #[error("clipboard unavailable")]
    ClipboardUnavailable {
        /// Operation that touched the clipboard.
        operation: &'static str,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_input(
        operation: &'static str,
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            operation,
            field,
            reason,
            value: Some(value.into()),
        }
    }
}
