//! Permission backend seam.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use filebroker_protocol::FilePermissions;

use crate::error::PermissionsResult;

/// Reads and edits the access-control state of filesystem objects.
#[async_trait]
pub trait PermissionsEngine: Send + Sync {
    /// Snapshot the owner and access rules of `path`.
    async fn load(&self, path: &Path, is_folder: bool) -> PermissionsResult<FilePermissions>;

    /// Write back an edited snapshot, owner included.
    async fn apply(&self, permissions: &FilePermissions) -> PermissionsResult<()>;

    /// Hand `path` to the identity named by `owner_sid`.
    async fn set_owner(&self, path: &Path, is_folder: bool, owner_sid: &str)
    -> PermissionsResult<()>;

    /// Block or restore inheritance of parent rules.
    async fn set_access_rule_protection(
        &self,
        path: &Path,
        is_folder: bool,
        is_protected: bool,
        preserve_inheritance: bool,
    ) -> PermissionsResult<()>;

    /// Let the user pick an account; `None` when nothing was chosen.
    async fn open_object_picker(&self, hwnd: i64) -> PermissionsResult<Option<String>>;
}

/// Backend for the current platform.
#[must_use]
pub fn platform_engine() -> Arc<dyn PermissionsEngine> {
    #[cfg(unix)]
    {
        Arc::new(crate::posix::PosixPermissionsEngine::new())
    }
    #[cfg(not(unix))]
    {
        Arc::new(crate::unsupported::UnsupportedPermissionsEngine)
    }
}
