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

//! Shortcut parsing and writing.
//!
//! Layout: `lnk.rs` (binary shell-link codec), `internet.rs` (`.url` files),
//! `resolve.rs` (bounded target classification), `codec.rs` (extension
//! dispatch and the record handed back to callers), `error.rs`.

pub mod codec;
pub mod error;
pub mod internet;
pub mod lnk;
pub mod resolve;

pub use codec::{LinkSpec, ShortcutKind, ShortcutRecord, parse_shortcut, write_shortcut};
pub use error::{ShortcutError, ShortcutResult};
pub use lnk::{LinkFlags, LinkInfo, ShellLink};
