//! Drag-drop receive: enumerate clipboard packages and place them under a drop folder.
//!
//! # Design
//! - Each package is placed in isolation; one failure never stops the rest.
//! - A package owns its content stream and is dropped as soon as it has been
//!   processed, whatever the outcome.
//! - File packages are created with `create_new` under a collision-free name.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::clipboard::DataObject;
use crate::error::{FsOpsError, FsOpsResult};
use crate::naming::unique_path;

/// One entry of a clipboard payload.
pub enum DataPackage {
    /// A file with its relative name and exclusively owned content.
    File {
        /// Relative name under the drop folder.
        name: String,
        /// Content stream.
        stream: Box<dyn Read + Send>,
    },
    /// A directory marker.
    Directory {
        /// Relative name under the drop folder.
        name: String,
    },
}

impl DataPackage {
    /// Relative name of the package.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Directory { name } => name,
        }
    }
}

impl fmt::Debug for DataPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { name, .. } => f.debug_struct("File").field("name", name).finish_non_exhaustive(),
            Self::Directory { name } => f.debug_struct("Directory").field("name", name).finish(),
        }
    }
}

/// Outcome of a drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropReport {
    /// Paths created or confirmed under the drop folder.
    pub placed: Vec<PathBuf>,
    /// Number of packages that could not be placed.
    pub failures: usize,
}

impl DropReport {
    /// Whether every package was placed.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failures == 0
    }
}

enum PackageSource {
    Directory(String),
    Bytes(String, Vec<u8>),
    Disk(String, PathBuf),
}

impl PackageSource {
    fn open(self) -> io::Result<DataPackage> {
        Ok(match self {
            Self::Directory(name) => DataPackage::Directory { name },
            Self::Bytes(name, bytes) => DataPackage::File {
                name,
                stream: Box::new(Cursor::new(bytes)),
            },
            Self::Disk(name, path) => DataPackage::File {
                name,
                stream: Box::new(File::open(path)?),
            },
        })
    }
}

/// Place every package of `data` under `drop_path`.
///
/// Virtual entries are used as-is; otherwise the file-drop list is expanded,
/// directories recursively with relative names.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when `drop_path` itself cannot be created.
pub fn receive_data(drop_path: &Path, data: &DataObject) -> FsOpsResult<DropReport> {
    let sources = enumerate(data);
    receive_packages(
        drop_path,
        sources
            .into_iter()
            .map(|source| source.and_then(PackageSource::open)),
    )
}

/// Place packages under `drop_path`, dropping each one once it is processed.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when `drop_path` itself cannot be created.
pub fn receive_packages<I>(drop_path: &Path, packages: I) -> FsOpsResult<DropReport>
where
    I: IntoIterator<Item = io::Result<DataPackage>>,
{
    fs::create_dir_all(drop_path).map_err(|err| FsOpsError::io("dragdrop.prepare", drop_path, err))?;
    let mut report = DropReport::default();
    for package in packages {
        let package = match package {
            Ok(package) => package,
            Err(err) => {
                warn!(error = %err, "drop entry unreadable");
                report.failures += 1;
                continue;
            }
        };
        let name = package.name().to_string();
        match place(drop_path, package) {
            Ok(path) => report.placed.push(path),
            Err(err) => {
                warn!(entry = %name, error = %err, "drop entry failed");
                report.failures += 1;
            }
        }
    }
    Ok(report)
}

fn place(drop_path: &Path, package: DataPackage) -> io::Result<PathBuf> {
    let relative = relative_path(package.name()).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "entry name must be relative without parent components")
    })?;
    let target = drop_path.join(relative);
    match package {
        DataPackage::Directory { .. } => {
            fs::create_dir_all(&target)?;
            Ok(target)
        }
        DataPackage::File { mut stream, .. } => {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let target = unique_path(&target, false);
            let mut file = OpenOptions::new().write(true).create_new(true).open(&target)?;
            io::copy(&mut stream, &mut file)?;
            debug!(target = %target.display(), "drop entry placed");
            Ok(target)
        }
    }
}

fn relative_path(name: &str) -> Option<PathBuf> {
    if name.starts_with(['/', '\\']) || Path::new(name).is_absolute() || name.contains(':') {
        return None;
    }
    let mut path = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return None,
            other => path.push(other),
        }
    }
    (!path.as_os_str().is_empty()).then_some(path)
}

fn enumerate(data: &DataObject) -> Vec<io::Result<PackageSource>> {
    if !data.virtual_entries().is_empty() {
        return data
            .virtual_entries()
            .iter()
            .map(|entry| match &entry.content {
                Some(bytes) => Ok(PackageSource::Bytes(entry.name.clone(), bytes.clone())),
                None => Ok(PackageSource::Directory(entry.name.clone())),
            })
            .collect();
    }

    let mut sources = Vec::new();
    for path in data.file_drop_list() {
        let Some(root_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !path.is_dir() {
            sources.push(Ok(PackageSource::Disk(root_name, path.clone())));
            continue;
        }
        sources.push(Ok(PackageSource::Directory(root_name.clone())));
        for entry in WalkDir::new(path).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    sources.push(Err(io::Error::from(err)));
                    continue;
                }
            };
            let Ok(relative) = entry.path().strip_prefix(path) else {
                continue;
            };
            let name = format!("{root_name}/{}", relative.to_string_lossy().replace('\\', "/"));
            if entry.file_type().is_dir() {
                sources.push(Ok(PackageSource::Directory(name)));
            } else {
                sources.push(Ok(PackageSource::Disk(name, entry.path().to_path_buf())));
            }
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::DropEffect;
    use filebroker_test_support::TempTree;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        drops: Arc<AtomicUsize>,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Drop for CountingReader {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted(name: &str, bytes: &[u8], drops: &Arc<AtomicUsize>) -> io::Result<DataPackage> {
        Ok(DataPackage::File {
            name: name.to_string(),
            stream: Box::new(CountingReader {
                inner: Cursor::new(bytes.to_vec()),
                drops: Arc::clone(drops),
            }),
        })
    }

    #[test]
    fn names_must_stay_inside_drop_folder() {
        assert_eq!(relative_path("a/b.txt"), Some(PathBuf::from("a").join("b.txt")));
        assert_eq!(relative_path("a\\b.txt"), Some(PathBuf::from("a").join("b.txt")));
        assert_eq!(relative_path("./c.txt"), Some(PathBuf::from("c.txt")));
        assert!(relative_path("/etc/passwd").is_none());
        assert!(relative_path("C:\\x").is_none());
        assert!(relative_path("a/../../x").is_none());
        assert!(relative_path("").is_none());
    }

    #[test]
    fn every_stream_is_released_even_on_failure() -> anyhow::Result<()> {
        let tree = TempTree::new()?;
        let drops = Arc::new(AtomicUsize::new(0));
        let packages = vec![
            counted("ok.txt", b"ok", &drops),
            counted("../escape.txt", b"bad", &drops),
            Err(io::Error::other("unreadable")),
            counted("nested/deep.txt", b"deep", &drops),
        ];

        let report = receive_packages(&tree.join("drop"), packages)?;

        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert_eq!(report.failures, 2);
        assert!(!report.success());
        assert_eq!(tree.read_to_string("drop/ok.txt")?, "ok");
        assert_eq!(tree.read_to_string("drop/nested/deep.txt")?, "deep");
        assert!(!tree.exists("escape.txt"));
        Ok(())
    }

    #[test]
    fn missing_drop_folder_is_created_and_collisions_are_suffixed() -> anyhow::Result<()> {
        let tree = TempTree::new()?;
        tree.write_file("drop/a/b/note.txt", "existing")?;
        let mut data = DataObject::new();
        data.push_virtual_file("note.txt", b"new".to_vec());
        let report = receive_data(&tree.join("drop/a/b"), &data)?;
        assert!(report.success());
        assert_eq!(report.placed, vec![tree.join("drop/a/b/note (2).txt")]);
        assert_eq!(tree.read_to_string("drop/a/b/note.txt")?, "existing");

        let report = receive_data(&tree.join("fresh/x/y"), &data)?;
        assert!(report.success());
        assert_eq!(tree.read_to_string("fresh/x/y/note.txt")?, "new");
        Ok(())
    }

    #[test]
    fn existing_directory_entry_is_a_no_op() -> anyhow::Result<()> {
        let tree = TempTree::new()?;
        tree.write_file("drop/photos/keep.jpg", "k")?;
        let mut data = DataObject::new();
        data.push_virtual_directory("photos");
        let report = receive_data(&tree.join("drop"), &data)?;
        assert!(report.success());
        assert_eq!(tree.list("drop/photos")?, vec!["keep.jpg".to_string()]);
        Ok(())
    }

    #[test]
    fn file_drop_list_expands_directories_with_relative_names() -> anyhow::Result<()> {
        let tree = TempTree::new()?;
        let file = tree.write_file("src/readme.md", "r")?;
        tree.write_file("src/album/one.png", "1")?;
        tree.write_file("src/album/sub/two.png", "2")?;
        let data = DataObject::file_drop(vec![file, tree.join("src/album")], DropEffect::Copy);

        let report = receive_data(&tree.join("dst"), &data)?;

        assert!(report.success());
        assert_eq!(tree.read_to_string("dst/readme.md")?, "r");
        assert_eq!(tree.read_to_string("dst/album/one.png")?, "1");
        assert_eq!(tree.read_to_string("dst/album/sub/two.png")?, "2");
        Ok(())
    }
}
