//! Clipboard data model, stores and the apartment-bound bridge.
//!
//! # Design
//! - A [`DataObject`] carries a file-drop list, named auxiliary formats and
//!   virtual entries (name plus content) for payloads that are not files on disk.
//! - Move intent is the `Preferred DropEffect` format holding `2` as a
//!   little-endian `u32`; copy publishes no marker.
//! - Every clipboard access runs on the apartment worker.
//! - The broker publishes through [`crate::SystemClipboard`]; [`MemoryClipboard`]
//!   stands in where no desktop is attached.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::apartment::ApartmentWorker;
use crate::dragdrop::{self, DropReport};
use crate::error::{FsOpsError, FsOpsResult};

/// Auxiliary format carrying the intended drop effect.
pub const PREFERRED_DROP_EFFECT: &str = "Preferred DropEffect";
const DROP_EFFECT_COPY: u32 = 1;
const DROP_EFFECT_MOVE: u32 = 2;

/// Intended effect of a clipboard transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    /// Copy the items.
    Copy,
    /// Move the items.
    Move,
}

impl DropEffect {
    /// Wire value of the effect.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Copy => DROP_EFFECT_COPY,
            Self::Move => DROP_EFFECT_MOVE,
        }
    }
}

/// A virtual clipboard entry: a relative name and, for files, its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEntry {
    /// Relative name; `/` or `\` separate nested folders.
    pub name: String,
    /// File content, or `None` for a directory marker.
    pub content: Option<Vec<u8>>,
}

/// Clipboard payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataObject {
    file_drop: Vec<PathBuf>,
    formats: BTreeMap<String, Vec<u8>>,
    virtual_entries: Vec<VirtualEntry>,
}

impl DataObject {
    /// Empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload listing files for a copy or move.
    #[must_use]
    pub fn file_drop(paths: Vec<PathBuf>, effect: DropEffect) -> Self {
        let mut data = Self {
            file_drop: paths,
            ..Self::default()
        };
        if effect == DropEffect::Move {
            data.set_format(PREFERRED_DROP_EFFECT, DROP_EFFECT_MOVE.to_le_bytes().to_vec());
        }
        data
    }

    /// Files listed on the payload.
    #[must_use]
    pub fn file_drop_list(&self) -> &[PathBuf] {
        &self.file_drop
    }

    /// Set an auxiliary format.
    pub fn set_format(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.formats.insert(name.into(), bytes);
    }

    /// Bytes of an auxiliary format.
    #[must_use]
    pub fn format(&self, name: &str) -> Option<&[u8]> {
        self.formats.get(name).map(Vec::as_slice)
    }

    /// Add a virtual file.
    pub fn push_virtual_file(&mut self, name: impl Into<String>, content: Vec<u8>) {
        self.virtual_entries.push(VirtualEntry {
            name: name.into(),
            content: Some(content),
        });
    }

    /// Add a virtual directory marker.
    pub fn push_virtual_directory(&mut self, name: impl Into<String>) {
        self.virtual_entries.push(VirtualEntry {
            name: name.into(),
            content: None,
        });
    }

    /// Virtual entries in insertion order.
    #[must_use]
    pub fn virtual_entries(&self) -> &[VirtualEntry] {
        &self.virtual_entries
    }

    /// Effect requested by the payload; absent or unknown markers mean copy.
    #[must_use]
    pub fn drop_effect(&self) -> DropEffect {
        let marker = self
            .format(PREFERRED_DROP_EFFECT)
            .and_then(|bytes| <[u8; 4]>::try_from(bytes.get(..4)?).ok())
            .map(u32::from_le_bytes);
        if marker == Some(DROP_EFFECT_MOVE) {
            DropEffect::Move
        } else {
            DropEffect::Copy
        }
    }
}

/// Storage for the current clipboard payload.
pub trait ClipboardStore: Send + Sync {
    /// Replace the payload.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    fn set(&self, data: DataObject) -> FsOpsResult<()>;

    /// Current payload, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    fn get(&self) -> FsOpsResult<Option<DataObject>>;

    /// Remove the payload.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    fn clear(&self) -> FsOpsResult<()>;
}

/// In-process clipboard for tests and headless use; last writer wins.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    inner: Arc<Mutex<Option<DataObject>>>,
}

impl MemoryClipboard {
    /// Empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardStore for MemoryClipboard {
    fn set(&self, data: DataObject) -> FsOpsResult<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| FsOpsError::ClipboardUnavailable { operation: "clipboard.set" })?;
        *guard = Some(data);
        Ok(())
    }

    fn get(&self) -> FsOpsResult<Option<DataObject>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| FsOpsError::ClipboardUnavailable { operation: "clipboard.get" })?;
        Ok(guard.clone())
    }

    fn clear(&self) -> FsOpsResult<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| FsOpsError::ClipboardUnavailable { operation: "clipboard.clear" })?;
        *guard = None;
        Ok(())
    }
}

/// Clipboard publishing and drag-drop receiving, serialized on the apartment worker.
#[derive(Clone)]
pub struct ClipboardBridge {
    worker: ApartmentWorker,
    store: Arc<dyn ClipboardStore>,
}

impl std::fmt::Debug for ClipboardBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardBridge")
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl ClipboardBridge {
    /// Bridge over `store`.
    #[must_use]
    pub fn new(worker: ApartmentWorker, store: Arc<dyn ClipboardStore>) -> Self {
        Self { worker, store }
    }

    /// Clear the clipboard and publish `paths` with the requested effect.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker or the store is unavailable.
    pub async fn set_files(&self, paths: Vec<PathBuf>, effect: DropEffect) -> FsOpsResult<()> {
        let store = Arc::clone(&self.store);
        let count = paths.len();
        self.worker
            .run("clipboard.set_files", move || -> FsOpsResult<()> {
                store.clear()?;
                store.set(DataObject::file_drop(paths, effect))
            })
            .await??;
        info!(count, effect = ?effect, "published clipboard file list");
        Ok(())
    }

    /// Place the current clipboard payload under `drop_path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker or the store is unavailable. Per-entry
    /// failures are reported on the [`DropReport`].
    pub async fn receive_drop(&self, drop_path: &Path) -> FsOpsResult<DropReport> {
        let store = Arc::clone(&self.store);
        let drop_path = drop_path.to_path_buf();
        self.worker
            .run("clipboard.receive_drop", move || -> FsOpsResult<DropReport> {
                let Some(data) = store.get()? else {
                    debug!(drop_path = %drop_path.display(), "clipboard empty, nothing to drop");
                    return Ok(DropReport::default());
                };
                dragdrop::receive_data(&drop_path, &data)
            })
            .await?
    }
}
