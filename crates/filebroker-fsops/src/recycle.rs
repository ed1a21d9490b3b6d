//! Recycle bins for non-permanent deletes.
//!
//! # Design
//! - [`SystemRecycleBin`] hands items to the OS recycle bin (the freedesktop
//!   trash on Linux) through the `trash` crate; naming and metadata there
//!   belong to the OS.
//! - [`StagingRecycleBin`] moves items into a plain directory under a
//!   collision-free name. It backs sandboxed deployments and tests.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::naming::unique_path;
use crate::transfer;

/// Destination of non-permanent deletes.
pub trait RecycleBin: Send + Sync + fmt::Debug {
    /// Recycle `path`, returning where it was stored when that is known.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the item is missing or cannot be recycled.
    fn recycle(&self, path: &Path) -> io::Result<Option<PathBuf>>;
}

/// The operating system's recycle bin.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRecycleBin;

impl RecycleBin for SystemRecycleBin {
    fn recycle(&self, path: &Path) -> io::Result<Option<PathBuf>> {
        fs::symlink_metadata(path)?;
        trash::delete(path).map_err(io::Error::other)?;
        debug!(path = %path.display(), "moved item to system recycle bin");
        Ok(None)
    }
}

/// Recycle bin rooted at a plain directory.
#[derive(Debug, Clone)]
pub struct StagingRecycleBin {
    root: PathBuf,
}

impl StagingRecycleBin {
    /// Bin rooted at `root`; the directory is created on first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RecycleBin for StagingRecycleBin {
    fn recycle(&self, path: &Path) -> io::Result<Option<PathBuf>> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        fs::create_dir_all(&self.root)?;
        let stored = unique_path(&self.root.join(name), metadata.is_dir());
        transfer::move_path(path, &stored)?;
        debug!(
            original = %path.display(),
            stored = %stored.display(),
            "staged recycled item"
        );
        Ok(Some(stored))
    }
}
