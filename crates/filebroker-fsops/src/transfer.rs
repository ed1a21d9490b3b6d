//! Low-level tree copy and move helpers shared by the engine and the recycle store.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy a file or directory tree to `target`, replacing colliding files and
/// merging into existing directories.
///
/// A file never replaces a directory and a directory never replaces a file;
/// either collision stops the copy with [`io::ErrorKind::AlreadyExists`].
pub(crate) fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let destination = if relative.as_os_str().is_empty() {
            target.to_path_buf()
        } else {
            target.join(relative)
        };
        let existing = fs::symlink_metadata(&destination).ok();
        if entry.file_type().is_dir() {
            match existing {
                Some(meta) if !meta.is_dir() => return Err(kind_conflict(&destination)),
                Some(_) => {}
                None => fs::create_dir_all(&destination)?,
            }
        } else {
            if existing.is_some_and(|meta| meta.is_dir()) {
                return Err(kind_conflict(&destination));
            }
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

fn kind_conflict(destination: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} exists as a different kind of entry", destination.display()),
    )
}

/// Move `source` to `target`, falling back to copy-then-delete across devices.
pub(crate) fn move_path(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            copy_tree(source, target)?;
            remove_path(source)
        }
        Err(err) => Err(err),
    }
}

/// Remove a file, symlink or directory tree.
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
