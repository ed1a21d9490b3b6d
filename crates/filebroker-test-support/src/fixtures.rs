//! Temporary directory fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// A scratch directory tree removed when dropped.
#[derive(Debug)]
pub struct TempTree {
    dir: TempDir,
}

impl TempTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temporary directory")?;
        Ok(Self { dir })
    }

    /// Root of the tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path for a relative entry, whether or not it exists.
    #[must_use]
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when the file or its parents cannot be written.
    pub fn write_file(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Create a directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn create_dir(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.join(relative);
        fs::create_dir_all(&path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(path)
    }

    /// Read a file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing or not UTF-8.
    pub fn read_to_string(&self, relative: impl AsRef<Path>) -> Result<String> {
        let path = self.join(relative);
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }

    /// Whether a relative entry exists.
    #[must_use]
    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.join(relative).exists()
    }

    /// Sorted names of the direct children of a relative directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be listed.
    pub fn list(&self, relative: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = self.join(relative);
        let mut names = fs::read_dir(&path)
            .with_context(|| format!("failed to list {}", path.display()))?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_nested_files_and_lists_children() -> Result<()> {
        let tree = TempTree::new()?;
        tree.write_file("a/b/c.txt", "hello")?;
        tree.create_dir("a/empty")?;
        assert!(tree.exists("a/b/c.txt"));
        assert_eq!(tree.read_to_string("a/b/c.txt")?, "hello");
        assert_eq!(tree.list("a")?, vec!["b".to_string(), "empty".to_string()]);
        Ok(())
    }

    #[test]
    fn tree_is_removed_on_drop() -> Result<()> {
        let tree = TempTree::new()?;
        let root = tree.path().to_path_buf();
        drop(tree);
        assert!(!root.exists());
        Ok(())
    }
}
