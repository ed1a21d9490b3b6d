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

//! Broker process wiring.
//!
//! Layout: `bootstrap.rs` (flags, configuration, startup), `services.rs`
//! (shared collaborators), `dispatcher.rs` (decode and route),
//! `handlers.rs` (per-operation logic), `transport.rs` (JSON lines over a
//! local socket or named pipe), `error.rs`.

/// Flags, configuration and startup.
pub mod bootstrap;
/// Request routing.
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod services;
pub mod transport;

pub use bootstrap::{Cli, run_app, run_app_with};
pub use dispatcher::Dispatcher;
pub use error::{AppError, AppResult};
pub use services::Services;
pub use transport::serve_connection;
