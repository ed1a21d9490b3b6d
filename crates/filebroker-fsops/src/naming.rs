//! Collision-free naming and extension handling.

use std::path::{Path, PathBuf};

/// First free path starting at `path`, then `stem (2).ext`, `stem (3).ext`, …
///
/// Directories never split an extension. Only safe for a single sequential
/// writer; callers that need exclusivity still open with `create_new`.
#[must_use]
pub fn unique_path(path: &Path, is_dir: bool) -> PathBuf {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return path.to_path_buf();
    };
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    (1_u32..)
        .map(|attempt| parent.join(candidate_name(&name, attempt, is_dir)))
        .find(|candidate| candidate.symlink_metadata().is_err())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Name for the given attempt; attempt 1 is the unchanged name.
pub(crate) fn candidate_name(name: &str, attempt: u32, is_dir: bool) -> String {
    if attempt <= 1 {
        return name.to_string();
    }
    let (stem, extension) = split_extension(name, is_dir);
    match extension {
        Some(ext) => format!("{stem} ({attempt}).{ext}"),
        None => format!("{stem} ({attempt})"),
    }
}

/// Keep the source's extension on a new name unless the new name already carries it.
///
/// Comparison is ASCII case-insensitive.
#[must_use]
pub fn preserve_extension(source: &Path, new_name: &str) -> String {
    let Some(ext) = source.extension().map(|e| e.to_string_lossy().into_owned()) else {
        return new_name.to_string();
    };
    let suffix = format!(".{ext}");
    let carries = new_name.len() > suffix.len()
        && new_name
            .get(new_name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(&suffix));
    if carries {
        new_name.to_string()
    } else {
        format!("{new_name}{suffix}")
    }
}

fn split_extension(name: &str, is_dir: bool) -> (&str, Option<&str>) {
    if is_dir {
        return (name, None);
    }
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(index) if index + 1 == name.len() => (name, None),
        Some(index) => (&name[..index], Some(&name[index + 1..])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn candidates_insert_counter_before_extension() {
        assert_eq!(candidate_name("report.txt", 1, false), "report.txt");
        assert_eq!(candidate_name("report.txt", 2, false), "report (2).txt");
        assert_eq!(candidate_name("archive.tar.gz", 3, false), "archive.tar (3).gz");
        assert_eq!(candidate_name(".profile", 2, false), ".profile (2)");
        assert_eq!(candidate_name("trailing.", 2, false), "trailing. (2)");
    }

    #[test]
    fn directories_never_split_extension() {
        assert_eq!(candidate_name("photos.2024", 2, true), "photos.2024 (2)");
    }

    #[test]
    fn unique_path_skips_existing_entries() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let requested = dir.path().join("a.txt");
        assert_eq!(unique_path(&requested, false), requested);

        fs::write(&requested, b"1")?;
        fs::write(dir.path().join("a (2).txt"), b"2")?;
        assert_eq!(unique_path(&requested, false), dir.path().join("a (3).txt"));
        Ok(())
    }

    #[test]
    fn preserve_extension_appends_missing_suffix() {
        let source = Path::new("/data/notes.TXT");
        assert_eq!(preserve_extension(source, "draft"), "draft.TXT");
        assert_eq!(preserve_extension(source, "draft.txt"), "draft.txt");
        assert_eq!(preserve_extension(source, "draft.md"), "draft.md.TXT");
        assert_eq!(preserve_extension(Path::new("/data/Makefile"), "Build"), "Build");
    }

    #[test]
    fn preserve_extension_does_not_treat_bare_suffix_as_match() {
        assert_eq!(preserve_extension(Path::new("a.txt"), ".txt"), ".txt.txt");
    }
}
