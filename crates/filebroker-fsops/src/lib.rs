//! Shell operations for the broker: batches, completion, recycling and clipboard transfer.
//!
//! Layout: `apartment.rs` (single-threaded worker), `engine.rs` (per-item
//! execution), `batch.rs` + `completion.rs` (homogeneous batches and their
//! awaitable outcome), `operations.rs` (single-call adapter), `recycle.rs`,
//! `naming.rs`, `clipboard.rs` + `system_clipboard.rs`, `dragdrop.rs`.
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

pub mod apartment;
pub mod batch;
pub mod clipboard;
pub mod completion;
pub mod dragdrop;
pub mod engine;
pub mod error;
pub mod naming;
pub mod operations;
pub mod recycle;
mod system_clipboard;
mod transfer;

pub use apartment::ApartmentWorker;
pub use batch::{BatchReport, ShellOperationBatch};
pub use clipboard::{
    ClipboardBridge, ClipboardStore, DataObject, DropEffect, MemoryClipboard, PREFERRED_DROP_EFFECT,
    VirtualEntry,
};
pub use system_clipboard::SystemClipboard;
pub use completion::{Completion, CompletionSignal, CompletionWaiter};
pub use dragdrop::{DataPackage, DropReport};
pub use engine::{
    FailureCode, ItemEvent, ItemOperation, LocalShellEngine, OperationKind, OperationOptions,
    ShellEngine,
};
pub use error::{FsOpsError, FsOpsResult};
pub use naming::unique_path;
pub use operations::{BatchOutcome, ShellOperations};
pub use recycle::{RecycleBin, StagingRecycleBin, SystemRecycleBin};
