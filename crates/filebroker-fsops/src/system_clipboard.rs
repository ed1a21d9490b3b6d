//! The desktop clipboard as a [`ClipboardStore`].
//!
//! # Design
//! - Windows publishes `CF_HDROP` plus the registered `Preferred DropEffect`
//!   format through `clipboard-win`, so Explorer and other shells see cuts.
//! - Elsewhere the file list travels through `arboard`. Those clipboards carry
//!   no drop-effect format, so the effect of a list published here is
//!   remembered and reapplied while the same list is still on the clipboard.
//! - Only file lists reach the desktop; virtual entries stay in-process.

use std::fmt;

use tracing::warn;

use crate::clipboard::{ClipboardStore, DataObject};
use crate::error::{FsOpsError, FsOpsResult};

/// Clipboard shared with the rest of the desktop.
pub struct SystemClipboard {
    backend: platform::Backend,
}

impl SystemClipboard {
    /// Handle to the desktop clipboard; nothing is opened until first use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: platform::Backend::new(),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemClipboard").finish_non_exhaustive()
    }
}

impl ClipboardStore for SystemClipboard {
    fn set(&self, data: DataObject) -> FsOpsResult<()> {
        self.backend.set(&data)
    }

    fn get(&self) -> FsOpsResult<Option<DataObject>> {
        self.backend.get()
    }

    fn clear(&self) -> FsOpsResult<()> {
        self.backend.clear()
    }
}

fn unavailable(operation: &'static str, err: &dyn fmt::Display) -> FsOpsError {
    warn!(operation, error = %err, "desktop clipboard unavailable");
    FsOpsError::ClipboardUnavailable { operation }
}

#[cfg(windows)]
mod platform {
    use std::path::PathBuf;

    use clipboard_win::{Clipboard, Getter, Setter, formats, raw};
    use tracing::debug;

    use super::unavailable;
    use crate::clipboard::{DataObject, DropEffect, PREFERRED_DROP_EFFECT};
    use crate::error::{FsOpsError, FsOpsResult};

    const OPEN_ATTEMPTS: usize = 10;

    pub(super) struct Backend;

    impl Backend {
        pub(super) const fn new() -> Self {
            Self
        }

        pub(super) fn set(&self, data: &DataObject) -> FsOpsResult<()> {
            const OPERATION: &str = "clipboard.set";
            let _session = open(OPERATION)?;
            raw::empty().map_err(|err| unavailable(OPERATION, &err))?;
            let paths: Vec<String> = data
                .file_drop_list()
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect();
            if !paths.is_empty() {
                formats::FileList
                    .write_clipboard(paths.as_slice())
                    .map_err(|err| unavailable(OPERATION, &err))?;
            }
            if let Some(effect) = data.format(PREFERRED_DROP_EFFECT) {
                let format = clipboard_win::register_format(PREFERRED_DROP_EFFECT)
                    .ok_or(FsOpsError::ClipboardUnavailable { operation: OPERATION })?;
                raw::set_without_clear(format.get(), effect)
                    .map_err(|err| unavailable(OPERATION, &err))?;
            }
            debug!(count = paths.len(), "file list placed on clipboard");
            Ok(())
        }

        pub(super) fn get(&self) -> FsOpsResult<Option<DataObject>> {
            const OPERATION: &str = "clipboard.get";
            let _session = open(OPERATION)?;
            if !clipboard_win::is_format_avail(formats::CF_HDROP.into()) {
                return Ok(None);
            }
            let mut paths: Vec<String> = Vec::new();
            formats::FileList
                .read_clipboard(&mut paths)
                .map_err(|err| unavailable(OPERATION, &err))?;
            let mut data =
                DataObject::file_drop(paths.into_iter().map(PathBuf::from).collect(), DropEffect::Copy);
            if let Some(format) = clipboard_win::register_format(PREFERRED_DROP_EFFECT)
                && clipboard_win::is_format_avail(format.get())
            {
                let mut effect = Vec::new();
                if formats::RawData(format.get()).read_clipboard(&mut effect).is_ok() {
                    data.set_format(PREFERRED_DROP_EFFECT, effect);
                }
            }
            Ok(Some(data))
        }

        pub(super) fn clear(&self) -> FsOpsResult<()> {
            const OPERATION: &str = "clipboard.clear";
            let _session = open(OPERATION)?;
            raw::empty().map_err(|err| unavailable(OPERATION, &err))
        }
    }

    fn open(operation: &'static str) -> FsOpsResult<Clipboard> {
        Clipboard::new_attempts(OPEN_ATTEMPTS).map_err(|err| unavailable(operation, &err))
    }
}

#[cfg(not(windows))]
mod platform {
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard};

    use tracing::debug;

    use super::unavailable;
    use crate::clipboard::{DataObject, DropEffect};
    use crate::error::{FsOpsError, FsOpsResult};

    /// The `arboard` handle is kept for the life of the broker: on X11 and
    /// Wayland the data is served by its owner and vanishes with it.
    #[derive(Default)]
    struct State {
        clipboard: Option<arboard::Clipboard>,
        published: Option<(Vec<PathBuf>, DropEffect)>,
    }

    pub(super) struct Backend {
        state: Mutex<State>,
    }

    impl Backend {
        pub(super) fn new() -> Self {
            Self {
                state: Mutex::new(State::default()),
            }
        }

        fn lock(&self, operation: &'static str) -> FsOpsResult<MutexGuard<'_, State>> {
            self.state
                .lock()
                .map_err(|_| FsOpsError::ClipboardUnavailable { operation })
        }

        pub(super) fn set(&self, data: &DataObject) -> FsOpsResult<()> {
            const OPERATION: &str = "clipboard.set";
            let mut state = self.lock(OPERATION)?;
            let clipboard = session(&mut state.clipboard, OPERATION)?;
            let paths = data.file_drop_list();
            if paths.is_empty() {
                clipboard.clear().map_err(|err| unavailable(OPERATION, &err))?;
            } else {
                clipboard
                    .set()
                    .file_list(paths)
                    .map_err(|err| unavailable(OPERATION, &err))?;
            }
            state.published = Some((paths.to_vec(), data.drop_effect()));
            debug!(count = paths.len(), "file list placed on clipboard");
            Ok(())
        }

        pub(super) fn get(&self) -> FsOpsResult<Option<DataObject>> {
            const OPERATION: &str = "clipboard.get";
            let mut state = self.lock(OPERATION)?;
            let clipboard = session(&mut state.clipboard, OPERATION)?;
            let paths = match clipboard.get().file_list() {
                Ok(paths) => paths,
                Err(arboard::Error::ContentNotAvailable) => return Ok(None),
                Err(err) => return Err(unavailable(OPERATION, &err)),
            };
            Ok(Some(remembered(state.published.as_ref(), paths)))
        }

        pub(super) fn clear(&self) -> FsOpsResult<()> {
            const OPERATION: &str = "clipboard.clear";
            let mut state = self.lock(OPERATION)?;
            state.published = None;
            session(&mut state.clipboard, OPERATION)?
                .clear()
                .map_err(|err| unavailable(OPERATION, &err))
        }
    }

    fn session<'a>(
        slot: &'a mut Option<arboard::Clipboard>,
        operation: &'static str,
    ) -> FsOpsResult<&'a mut arboard::Clipboard> {
        if slot.is_none() {
            *slot = Some(arboard::Clipboard::new().map_err(|err| unavailable(operation, &err))?);
        }
        slot.as_mut()
            .ok_or(FsOpsError::ClipboardUnavailable { operation })
    }

    /// Payload for `paths`, carrying the effect this process published when
    /// the clipboard still holds exactly that list.
    fn remembered(
        published: Option<&(Vec<PathBuf>, DropEffect)>,
        paths: Vec<PathBuf>,
    ) -> DataObject {
        let effect = match published {
            Some((list, effect)) if *list == paths => *effect,
            _ => DropEffect::Copy,
        };
        DataObject::file_drop(paths, effect)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn published_effect_applies_to_the_same_list_only() {
            let list = vec![PathBuf::from("/a"), PathBuf::from("/b")];
            let published = (list.clone(), DropEffect::Move);

            assert_eq!(remembered(Some(&published), list.clone()).drop_effect(), DropEffect::Move);
            assert_eq!(
                remembered(Some(&published), vec![PathBuf::from("/a")]).drop_effect(),
                DropEffect::Copy
            );
            assert_eq!(remembered(None, list).drop_effect(), DropEffect::Copy);
        }
    }
}
