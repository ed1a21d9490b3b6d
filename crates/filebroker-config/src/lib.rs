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

//! Layered configuration for the broker.
//!
//! Layout: `model.rs` (typed configuration), `defaults.rs` (platform defaults),
//! `loader.rs` (defaults → file → environment → overrides), `validate.rs`
//! (parsing and validation helpers), `error.rs` (errors).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Overrides};
pub use model::{BrokerConfig, LogFormatSetting, LoggingSettings};
