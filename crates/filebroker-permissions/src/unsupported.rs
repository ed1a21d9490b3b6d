//! Backend for platforms without a native permissions implementation.

use std::path::Path;

use async_trait::async_trait;
use filebroker_protocol::FilePermissions;

use crate::engine::PermissionsEngine;
use crate::error::{PermissionsError, PermissionsResult};

/// Reports every object as unreadable and refuses every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPermissionsEngine;

#[async_trait]
impl PermissionsEngine for UnsupportedPermissionsEngine {
    async fn load(&self, path: &Path, is_folder: bool) -> PermissionsResult<FilePermissions> {
        Ok(FilePermissions::unreadable(path.to_string_lossy(), is_folder))
    }

    async fn apply(&self, _permissions: &FilePermissions) -> PermissionsResult<()> {
        Err(PermissionsError::Unsupported {
            operation: "permissions.apply",
        })
    }

    async fn set_owner(
        &self,
        _path: &Path,
        _is_folder: bool,
        _owner_sid: &str,
    ) -> PermissionsResult<()> {
        Err(PermissionsError::Unsupported {
            operation: "permissions.set_owner",
        })
    }

    async fn set_access_rule_protection(
        &self,
        _path: &Path,
        _is_folder: bool,
        _is_protected: bool,
        _preserve_inheritance: bool,
    ) -> PermissionsResult<()> {
        Err(PermissionsError::Unsupported {
            operation: "permissions.set_access_rule_protection",
        })
    }

    async fn open_object_picker(&self, _hwnd: i64) -> PermissionsResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_as_unreadable_and_refuses_changes() {
        let engine = UnsupportedPermissionsEngine;
        let snapshot = engine.load(Path::new("C:\\data"), true).await;
        assert!(matches!(snapshot, Ok(state) if !state.can_read_file_permissions));
        assert!(engine.set_owner(Path::new("x"), false, "S-1-1-0").await.is_err());
    }
}
