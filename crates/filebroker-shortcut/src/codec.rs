//! Extension dispatch between the shell-link and internet-shortcut codecs.

use std::fs;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ShortcutError, ShortcutResult};
use crate::internet;
use crate::lnk::{self, ShellLink};
use crate::resolve::target_is_directory;

/// Shortcut file flavour, chosen by extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    /// Binary shell link.
    Link,
    /// Internet shortcut.
    Internet,
}

impl ShortcutKind {
    /// Classify `path` by extension.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcutError::UnsupportedExtension`] for anything but `.lnk` and `.url`.
    pub fn from_path(path: &Path) -> ShortcutResult<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("lnk") => Ok(Self::Link),
            Some("url") => Ok(Self::Internet),
            _ => Err(ShortcutError::UnsupportedExtension {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Fields reported for a parsed shortcut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutRecord {
    /// Target path or URL.
    pub target_path: Option<String>,
    /// Command-line arguments.
    pub arguments: Option<String>,
    /// Working directory.
    pub working_directory: Option<String>,
    /// Launch elevated.
    pub run_as_admin: bool,
    /// Target is a folder.
    pub is_folder: bool,
}

/// What to write into a shortcut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSpec {
    /// Target path or URL.
    pub target: String,
    /// Command-line arguments.
    pub arguments: Option<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Launch elevated.
    pub run_as_admin: bool,
}

/// Read a shortcut, resolving `.lnk` targets within `resolve_timeout`.
///
/// # Errors
///
/// Returns an error for unsupported extensions, unreadable files and corrupt
/// shell links. A `.url` file without a URL is [`ShortcutError::MissingUrl`].
pub async fn parse_shortcut(path: &Path, resolve_timeout: Duration) -> ShortcutResult<ShortcutRecord> {
    let kind = ShortcutKind::from_path(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ShortcutError::io("shortcut.read", path, err))?;
    match kind {
        ShortcutKind::Internet => {
            let text = String::from_utf8_lossy(&bytes);
            let url = internet::parse(&text).ok_or_else(|| ShortcutError::MissingUrl {
                path: path.to_path_buf(),
            })?;
            Ok(ShortcutRecord {
                target_path: Some(url),
                ..ShortcutRecord::default()
            })
        }
        ShortcutKind::Link => {
            let link = lnk::decode(&bytes)?;
            let target_path = link
                .target_path()
                .or_else(|| relative_target(path, link.relative_path.as_deref()));
            let resolved = match target_path.as_deref() {
                Some(target) => target_is_directory(target, resolve_timeout).await,
                None => None,
            };
            Ok(ShortcutRecord {
                is_folder: resolved.unwrap_or_else(|| link.is_directory()),
                run_as_admin: link.run_as_admin(),
                arguments: link.arguments,
                working_directory: link.working_dir,
                target_path,
            })
        }
    }
}

/// Write a shortcut, replacing any existing file.
///
/// # Errors
///
/// Returns an error for unsupported extensions and write failures.
pub fn write_shortcut(path: &Path, spec: &LinkSpec) -> ShortcutResult<()> {
    let bytes = match ShortcutKind::from_path(path)? {
        ShortcutKind::Internet => internet::render(&internet::normalize(&spec.target)).into_bytes(),
        ShortcutKind::Link => lnk::encode(&build_link(spec)),
    };
    fs::write(path, bytes).map_err(|err| ShortcutError::io("shortcut.write", path, err))?;
    debug!(path = %path.display(), "shortcut written");
    Ok(())
}

fn build_link(spec: &LinkSpec) -> ShellLink {
    let mut link = ShellLink::for_target(&spec.target);
    link.arguments = spec.arguments.clone().filter(|value| !value.is_empty());
    link.working_dir = spec.working_dir.clone().filter(|value| !value.is_empty());
    link.set_run_as_admin(spec.run_as_admin);
    if let Ok(metadata) = fs::metadata(&spec.target) {
        link.set_directory(metadata.is_dir());
        link.file_size = u32::try_from(metadata.len()).unwrap_or(u32::MAX);
        link.creation_time = metadata.created().ok().map(DateTime::<Utc>::from);
        link.access_time = metadata.accessed().ok().map(DateTime::<Utc>::from);
        link.write_time = metadata.modified().ok().map(DateTime::<Utc>::from);
    }
    link
}

fn relative_target(link_path: &Path, relative: Option<&str>) -> Option<String> {
    let relative = relative.filter(|value| !value.is_empty())?;
    let base = link_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let native = relative.replace(['\\', '/'], MAIN_SEPARATOR_STR);
    Some(base.join(PathBuf::from(native)).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(ShortcutKind::from_path(Path::new("a.LNK")).ok(), Some(ShortcutKind::Link));
        assert_eq!(ShortcutKind::from_path(Path::new("b.Url")).ok(), Some(ShortcutKind::Internet));
        assert!(matches!(
            ShortcutKind::from_path(Path::new("c.txt")),
            Err(ShortcutError::UnsupportedExtension { .. })
        ));
        assert!(ShortcutKind::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn relative_target_resolves_against_link_folder() {
        let resolved = relative_target(Path::new("/links/app.lnk"), Some(r"..\bin\app"));
        let expected = Path::new("/links").join("..").join("bin").join("app");
        assert_eq!(resolved, Some(expected.to_string_lossy().into_owned()));
        assert!(relative_target(Path::new("/links/app.lnk"), Some("")).is_none());
    }

    #[test]
    fn empty_strings_are_not_written() {
        let link = build_link(&LinkSpec {
            target: "/nowhere/tool".to_string(),
            arguments: Some(String::new()),
            working_dir: None,
            run_as_admin: false,
        });
        assert!(link.arguments.is_none());
        assert!(!link.is_directory());
    }
}
