#![forbid(unsafe_code)]
#![warn(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Wire model shared by the broker and its UI clients.
//!
//! Layout: `value.rs` (heterogeneous values and key/value sets), `request.rs`
//! (typed `fileop` decoding), `response.rs` (response builder and `RequestID`
//! echo), `permissions.rs` (permission payloads), `error.rs` (decode errors).

pub mod error;
pub mod permissions;
pub mod request;
pub mod response;
pub mod value;

pub use error::{DecodeError, DecodeResult};
pub use permissions::{AccessControlType, FilePermissions, FileSystemAccessRule, rights};
pub use request::{
    Decoded, Envelope, FileOpKind, FileOperation, IgnoreReason, LinkWrite, TransferOperation,
    decode,
};
pub use response::Response;
pub use value::{Blob, Value, ValueSet};

/// Key carrying the handler family of a request.
pub const ARGUMENTS_KEY: &str = "Arguments";
/// `Arguments` value routed to the file-operation dispatcher.
pub const FILE_OPERATION_ARGUMENT: &str = "FileOperation";
/// Key carrying the file-operation discriminant.
pub const FILEOP_KEY: &str = "fileop";
/// Key carrying the caller-supplied correlation token.
pub const REQUEST_ID_KEY: &str = "RequestID";
/// Key carrying the boolean outcome of an operation.
pub const SUCCESS_KEY: &str = "Success";
