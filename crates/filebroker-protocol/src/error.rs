//! # Design
//!
//! - A single error kind covers every way a request map can fail to decode.
//! - Messages stay constant; the offending field travels as context.

use thiserror::Error;

/// Result alias for request decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Request decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A required field was absent or null.
    #[error("request field missing")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// A field carried a value of the wrong type.
    #[error("request field has unexpected type")]
    WrongType {
        /// Name of the offending field.
        field: &'static str,
        /// Type the decoder expected.
        expected: &'static str,
        /// Type that was present on the wire.
        found: &'static str,
    },
    /// A field had the right type but an unusable value.
    #[error("request field has invalid value")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Machine-readable reason.
        reason: &'static str,
        /// Offending value when printable.
        value: Option<String>,
    },
    /// A field embedding JSON could not be parsed.
    #[error("request field has malformed json")]
    MalformedJson {
        /// Name of the offending field.
        field: &'static str,
        /// Underlying parser error.
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Field the failure relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field }
            | Self::WrongType { field, .. }
            | Self::InvalidValue { field, .. }
            | Self::MalformedJson { field, .. } => field,
        }
    }
}
