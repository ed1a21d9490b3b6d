#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]

//! Broker binary: listens for file-operation requests from the UI process.

use filebroker_app::{AppResult, run_app};

/// Run the broker until Ctrl-C.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
