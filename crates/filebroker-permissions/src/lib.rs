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

//! Reading and editing access-control state of filesystem objects.
//!
//! Layout: `engine.rs` (backend trait and platform selection), `sid.rs`
//! (identity strings), `posix.rs` (mode-bit backend on unix), `unsupported.rs`
//! (fallback elsewhere), `error.rs`.

pub mod engine;
pub mod error;
#[cfg(unix)]
pub mod posix;
pub mod sid;
#[cfg(not(unix))]
pub mod unsupported;

pub use engine::{PermissionsEngine, platform_engine};
pub use error::{PermissionsError, PermissionsResult};
#[cfg(unix)]
pub use posix::PosixPermissionsEngine;
pub use sid::Identity;
#[cfg(not(unix))]
pub use unsupported::UnsupportedPermissionsEngine;
