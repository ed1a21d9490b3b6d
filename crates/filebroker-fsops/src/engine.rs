//! Shell engine boundary and the portable local implementation.
//!
//! # Design
//! - An engine executes exactly one item at a time; batching and completion live
//!   in [`crate::batch`].
//! - Expected failures are reported as [`FailureCode`] values, never as errors.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::naming::{preserve_extension, unique_path};
use crate::recycle::RecycleBin;
use crate::transfer;

const REPLACED_SUFFIX: &str = ".replaced";

/// Kind of a homogeneous batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Delete (recycle or permanent).
    Delete,
    /// Rename within the same directory.
    Rename,
    /// Move to another directory.
    Move,
    /// Copy to another directory.
    Copy,
}

impl OperationKind {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::Move => "move",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options applied to every item in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationOptions {
    /// Never show progress or confirmation UI.
    pub no_ui: bool,
    /// Route deletes to the recycle store.
    pub recycle_on_delete: bool,
    /// Keep the source's extension on renamed items.
    pub preserve_extension: bool,
    /// Pick a free `name (N).ext` instead of replacing an existing destination.
    pub rename_on_collision: bool,
}

impl OperationOptions {
    /// Options for a delete request.
    #[must_use]
    pub const fn for_delete(permanently: bool) -> Self {
        Self {
            no_ui: true,
            recycle_on_delete: !permanently,
            preserve_extension: false,
            rename_on_collision: false,
        }
    }

    /// Options for rename, move and copy requests.
    #[must_use]
    pub const fn for_transfer(overwrite: bool) -> Self {
        Self {
            no_ui: true,
            recycle_on_delete: false,
            preserve_extension: !overwrite,
            rename_on_collision: !overwrite,
        }
    }
}

/// One queued item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOperation {
    /// Delete `source`.
    Delete {
        /// Item to delete.
        source: PathBuf,
    },
    /// Rename `source` in place.
    Rename {
        /// Item to rename.
        source: PathBuf,
        /// New leaf name.
        new_name: String,
    },
    /// Move `source` into `destination_dir` as `name`.
    Move {
        /// Item to move.
        source: PathBuf,
        /// Target folder.
        destination_dir: PathBuf,
        /// Leaf name in the target folder.
        name: String,
    },
    /// Copy `source` into `destination_dir` as `name`.
    Copy {
        /// Item to copy.
        source: PathBuf,
        /// Target folder.
        destination_dir: PathBuf,
        /// Leaf name in the target folder.
        name: String,
    },
}

impl ItemOperation {
    /// Kind of this item.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Delete { .. } => OperationKind::Delete,
            Self::Rename { .. } => OperationKind::Rename,
            Self::Move { .. } => OperationKind::Move,
            Self::Copy { .. } => OperationKind::Copy,
        }
    }

    /// Source path of this item.
    #[must_use]
    pub fn source(&self) -> &Path {
        match self {
            Self::Delete { source }
            | Self::Rename { source, .. }
            | Self::Move { source, .. }
            | Self::Copy { source, .. } => source,
        }
    }
}

/// Reason an item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    /// Source or destination folder does not exist.
    NotFound,
    /// The OS refused access.
    AccessDenied,
    /// Destination is occupied and could not be replaced.
    AlreadyExists,
    /// Disk or quota full.
    StorageFull,
    /// Name is not a valid single path component, or the move is into itself.
    InvalidName,
    /// Anything else.
    Other,
}

impl FailureCode {
    /// Classify an IO error.
    #[must_use]
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                Self::AccessDenied
            }
            io::ErrorKind::AlreadyExists
            | io::ErrorKind::DirectoryNotEmpty
            | io::ErrorKind::ResourceBusy => Self::AlreadyExists,
            io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => Self::StorageFull,
            io::ErrorKind::InvalidFilename | io::ErrorKind::InvalidInput => Self::InvalidName,
            _ => Self::Other,
        }
    }

    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::AlreadyExists => "already_exists",
            Self::StorageFull => "storage_full",
            Self::InvalidName => "invalid_name",
            Self::Other => "other",
        }
    }
}

/// Post-item event raised after each item is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEvent {
    /// Position of the item in its batch.
    pub index: usize,
    /// Kind of the batch.
    pub kind: OperationKind,
    /// Source path.
    pub source: PathBuf,
    /// Where the item ended up (recycle slot, renamed or transferred path).
    pub destination: Option<PathBuf>,
    /// Item result.
    pub result: Result<(), FailureCode>,
}

impl ItemEvent {
    /// Whether the item succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Executes single items.
pub trait ShellEngine: Send + Sync {
    /// Execute one item, returning where it ended up.
    ///
    /// # Errors
    ///
    /// Returns the [`FailureCode`] describing why the item failed.
    fn execute(
        &self,
        item: &ItemOperation,
        options: &OperationOptions,
    ) -> Result<Option<PathBuf>, FailureCode>;
}

/// Engine backed by `std::fs` and a [`RecycleBin`].
#[derive(Debug, Clone)]
pub struct LocalShellEngine {
    recycle: Arc<dyn RecycleBin>,
}

#[derive(Clone, Copy)]
enum Transfer {
    Move,
    Copy,
}

impl LocalShellEngine {
    /// Engine recycling into `recycle`.
    #[must_use]
    pub fn new(recycle: Arc<dyn RecycleBin>) -> Self {
        Self { recycle }
    }

    fn delete(&self, source: &Path, options: &OperationOptions) -> io::Result<Option<PathBuf>> {
        fs::symlink_metadata(source)?;
        if options.recycle_on_delete {
            self.recycle.recycle(source)
        } else {
            transfer::remove_path(source).map(|()| None)
        }
    }

    fn rename(
        source: &Path,
        new_name: &str,
        options: &OperationOptions,
    ) -> Result<Option<PathBuf>, FailureCode> {
        if !is_single_component(new_name) {
            return Err(FailureCode::InvalidName);
        }
        let metadata = fs::symlink_metadata(source).map_err(|err| io_failure(source, &err))?;
        let name = if options.preserve_extension && !metadata.is_dir() {
            preserve_extension(source, new_name)
        } else {
            new_name.to_string()
        };
        let parent = source.parent().ok_or(FailureCode::InvalidName)?;
        place(source, &parent.join(name), metadata.is_dir(), options, Transfer::Move)
    }

    fn transfer(
        source: &Path,
        destination_dir: &Path,
        name: &str,
        options: &OperationOptions,
        mode: Transfer,
    ) -> Result<Option<PathBuf>, FailureCode> {
        if !is_single_component(name) {
            return Err(FailureCode::InvalidName);
        }
        let metadata = fs::symlink_metadata(source).map_err(|err| io_failure(source, &err))?;
        let destination_meta =
            fs::metadata(destination_dir).map_err(|err| io_failure(destination_dir, &err))?;
        if !destination_meta.is_dir() {
            return Err(FailureCode::NotFound);
        }
        let target = destination_dir.join(name);
        if metadata.is_dir() && is_within(source, &target) {
            return Err(FailureCode::InvalidName);
        }
        place(source, &target, metadata.is_dir(), options, mode)
    }
}

impl ShellEngine for LocalShellEngine {
    fn execute(
        &self,
        item: &ItemOperation,
        options: &OperationOptions,
    ) -> Result<Option<PathBuf>, FailureCode> {
        match item {
            ItemOperation::Delete { source } => {
                self.delete(source, options).map_err(|err| io_failure(source, &err))
            }
            ItemOperation::Rename { source, new_name } => Self::rename(source, new_name, options),
            ItemOperation::Move {
                source,
                destination_dir,
                name,
            } => Self::transfer(source, destination_dir, name, options, Transfer::Move),
            ItemOperation::Copy {
                source,
                destination_dir,
                name,
            } => Self::transfer(source, destination_dir, name, options, Transfer::Copy),
        }
    }
}

/// Put `source` at `requested`.
///
/// Nothing at `requested` is removed until the transfer has succeeded: a
/// replaced file is first renamed aside and renamed back if the transfer
/// fails. Folders merge into folders; a file and a folder never replace
/// each other.
fn place(
    source: &Path,
    requested: &Path,
    source_is_dir: bool,
    options: &OperationOptions,
    mode: Transfer,
) -> Result<Option<PathBuf>, FailureCode> {
    let mut target = requested.to_path_buf();
    let mut displaced = None;
    if let Ok(existing) = fs::symlink_metadata(&target) {
        if same_entry(source, &target) {
            return place_onto_self(source, &target, source_is_dir, mode);
        }
        if options.rename_on_collision {
            target = unique_path(requested, source_is_dir);
        } else if source_is_dir != existing.is_dir() {
            debug!(
                source = %source.display(),
                target = %target.display(),
                "file and folder cannot replace each other"
            );
            return Err(FailureCode::AlreadyExists);
        } else if !source_is_dir {
            displaced = Some(set_aside(&target).map_err(|err| io_failure(&target, &err))?);
        }
    }

    let merge = source_is_dir && target.is_dir();
    let outcome = match (mode, merge) {
        (Transfer::Move, false) => transfer::move_path(source, &target),
        (Transfer::Move, true) => {
            transfer::copy_tree(source, &target).and_then(|()| transfer::remove_path(source))
        }
        (Transfer::Copy, _) => transfer::copy_tree(source, &target),
    };
    if let Err(err) = outcome {
        if let Some(aside) = displaced {
            put_back(&aside, &target);
        }
        return Err(io_failure(source, &err));
    }
    if let Some(aside) = displaced
        && let Err(err) = transfer::remove_path(&aside)
    {
        warn!(path = %aside.display(), error = %err, "replaced item left behind");
    }
    Ok(Some(target))
}

/// `source` and `target` name the same entry: a move only changes spelling
/// (case on case-insensitive volumes), a copy lands beside the original.
fn place_onto_self(
    source: &Path,
    target: &Path,
    source_is_dir: bool,
    mode: Transfer,
) -> Result<Option<PathBuf>, FailureCode> {
    match mode {
        Transfer::Move => {
            if source.file_name() != target.file_name() {
                fs::rename(source, target).map_err(|err| io_failure(source, &err))?;
            }
            Ok(Some(target.to_path_buf()))
        }
        Transfer::Copy => {
            let copy = unique_path(target, source_is_dir);
            transfer::copy_tree(source, &copy).map_err(|err| io_failure(source, &err))?;
            Ok(Some(copy))
        }
    }
}

fn set_aside(target: &Path) -> io::Result<PathBuf> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let aside = unique_path(&parent.join(format!(".{name}{REPLACED_SUFFIX}")), false);
    fs::rename(target, &aside)?;
    Ok(aside)
}

fn put_back(aside: &Path, target: &Path) {
    if fs::symlink_metadata(target).is_ok_and(|meta| !meta.is_dir()) {
        let _ = fs::remove_file(target);
    }
    if let Err(err) = fs::rename(aside, target) {
        warn!(
            aside = %aside.display(),
            target = %target.display(),
            error = %err,
            "could not restore replaced item"
        );
    }
}

/// Canonical location of `path` with its final component left unresolved,
/// so `..` and symlinked folders collapse while a symlink leaf stays itself.
fn resolved_location(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::canonicalize(parent).ok().map(|dir| dir.join(name))
}

fn same_entry(a: &Path, b: &Path) -> bool {
    match (resolved_location(a), resolved_location(b)) {
        (Some(a), Some(b)) => same_spelling(&a, &b),
        _ => a == b,
    }
}

#[cfg(windows)]
fn same_spelling(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

#[cfg(not(windows))]
fn same_spelling(a: &Path, b: &Path) -> bool {
    a == b
}

fn io_failure(path: &Path, err: &io::Error) -> FailureCode {
    let code = FailureCode::from_io(err);
    debug!(path = %path.display(), code = code.as_str(), error = %err, "shell item failed");
    code
}

fn is_single_component(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn is_within(ancestor: &Path, candidate: &Path) -> bool {
    let (Some(ancestor), Some(candidate)) =
        (resolved_location(ancestor), resolved_location(candidate))
    else {
        return false;
    };
    candidate != ancestor && candidate.starts_with(&ancestor)
}
