//! Mode-bit permissions.
//!
//! Each of the owner, group and other classes surfaces as one allow rule whose
//! mask is built from the generic read, write and execute rights. Applying a
//! snapshot folds the explicit rules back into mode bits, with deny rules
//! clearing what allow rules granted. Modes never inherit, so every object
//! reports its rules as protected.

use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use filebroker_protocol::{AccessControlType, FilePermissions, FileSystemAccessRule, rights};
use nix::unistd::{Uid, chown};
use tokio::task;
use tracing::debug;

use crate::engine::PermissionsEngine;
use crate::error::{PermissionsError, PermissionsResult};
use crate::sid::Identity;

const READ: u32 = 0o4;
const WRITE: u32 = 0o2;
const EXECUTE: u32 = 0o1;
const CLASS_BITS: u32 = 0o7;
const SPECIAL_BITS: u32 = 0o7000;
const OWNER_SHIFT: u32 = 6;
const GROUP_SHIFT: u32 = 3;
const OTHER_SHIFT: u32 = 0;

/// Backend over POSIX ownership and mode bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixPermissionsEngine;

impl PosixPermissionsEngine {
    /// Construct the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PermissionsEngine for PosixPermissionsEngine {
    async fn load(&self, path: &Path, is_folder: bool) -> PermissionsResult<FilePermissions> {
        let path = path.to_path_buf();
        blocking("permissions.load", move || read_permissions(&path, is_folder)).await
    }

    async fn apply(&self, permissions: &FilePermissions) -> PermissionsResult<()> {
        let permissions = permissions.clone();
        blocking("permissions.apply", move || write_permissions(&permissions)).await
    }

    async fn set_owner(
        &self,
        path: &Path,
        _is_folder: bool,
        owner_sid: &str,
    ) -> PermissionsResult<()> {
        let path = path.to_path_buf();
        let owner_sid = owner_sid.to_string();
        blocking("permissions.set_owner", move || {
            let Some(Identity::User(uid)) = Identity::parse(&owner_sid) else {
                return Err(PermissionsError::invalid_sid("permissions.set_owner", &owner_sid));
            };
            change_owner("permissions.set_owner", &path, uid)
        })
        .await
    }

    async fn set_access_rule_protection(
        &self,
        path: &Path,
        _is_folder: bool,
        is_protected: bool,
        _preserve_inheritance: bool,
    ) -> PermissionsResult<()> {
        if is_protected {
            debug!(path = %path.display(), "mode bits are always protected");
            Ok(())
        } else {
            Err(PermissionsError::Unsupported {
                operation: "permissions.set_access_rule_protection",
            })
        }
    }

    async fn open_object_picker(&self, _hwnd: i64) -> PermissionsResult<Option<String>> {
        Ok(None)
    }
}

async fn blocking<T, F>(operation: &'static str, job: F) -> PermissionsResult<T>
where
    F: FnOnce() -> PermissionsResult<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(job)
        .await
        .map_err(|_| PermissionsError::Worker { operation })?
}

fn read_permissions(path: &Path, is_folder: bool) -> PermissionsResult<FilePermissions> {
    let metadata =
        fs::metadata(path).map_err(|err| PermissionsError::io("permissions.load", path, err))?;
    let mode = metadata.mode();
    let owner = Identity::User(metadata.uid());
    let classes = [
        (owner, OWNER_SHIFT),
        (Identity::Group(metadata.gid()), GROUP_SHIFT),
        (Identity::Everyone, OTHER_SHIFT),
    ];
    let access_rules = classes
        .into_iter()
        .filter_map(|(identity, shift)| {
            let mask = rights_from_bits((mode >> shift) & CLASS_BITS);
            (mask != 0).then(|| FileSystemAccessRule {
                identity_reference: identity.to_string(),
                access_control_type: AccessControlType::Allow,
                file_system_rights: mask,
                is_inherited: false,
                inheritance_flags: 0,
                propagation_flags: 0,
            })
        })
        .collect();
    Ok(FilePermissions {
        file_path: path.to_string_lossy().into_owned(),
        is_folder,
        owner_sid: Some(owner.to_string()),
        are_access_rules_protected: true,
        can_read_file_permissions: true,
        access_rules,
    })
}

/// Resolve the owner and every rule before touching the file, so a rejected
/// snapshot changes nothing.
fn write_permissions(permissions: &FilePermissions) -> PermissionsResult<()> {
    const OPERATION: &str = "permissions.apply";
    let path = PathBuf::from(&permissions.file_path);
    let metadata =
        fs::metadata(&path).map_err(|err| PermissionsError::io(OPERATION, &path, err))?;

    let new_owner = match permissions.owner_sid.as_deref() {
        Some(owner_sid) => match Identity::parse(owner_sid) {
            Some(Identity::User(uid)) if uid == metadata.uid() => None,
            Some(Identity::User(uid)) => Some(uid),
            _ => return Err(PermissionsError::invalid_sid(OPERATION, owner_sid)),
        },
        None => None,
    };
    let uid = new_owner.unwrap_or_else(|| metadata.uid());
    let gid = metadata.gid();

    let mut allowed = 0;
    let mut denied = 0;
    for rule in permissions.access_rules.iter().filter(|rule| !rule.is_inherited) {
        let shift = match Identity::parse(&rule.identity_reference) {
            Some(Identity::User(id)) if id == uid => OWNER_SHIFT,
            Some(Identity::Group(id)) if id == gid => GROUP_SHIFT,
            Some(Identity::Everyone) => OTHER_SHIFT,
            _ => {
                return Err(PermissionsError::invalid_sid(
                    OPERATION,
                    &rule.identity_reference,
                ));
            }
        };
        let bits = bits_from_rights(rule.file_system_rights) << shift;
        match rule.access_control_type {
            AccessControlType::Allow => allowed |= bits,
            AccessControlType::Deny => denied |= bits,
        }
    }
    let mode = (metadata.mode() & SPECIAL_BITS) | (allowed & !denied);

    if let Some(uid) = new_owner {
        change_owner(OPERATION, &path, uid)?;
    }
    fs::set_permissions(&path, Permissions::from_mode(mode))
        .map_err(|err| PermissionsError::io(OPERATION, &path, err))?;
    debug!(path = %path.display(), mode = %format_args!("{mode:04o}"), "permissions applied");
    Ok(())
}

fn change_owner(operation: &'static str, path: &Path, uid: u32) -> PermissionsResult<()> {
    chown(path, Some(Uid::from_raw(uid)), None)
        .map_err(|errno| PermissionsError::io(operation, path, io::Error::from(errno)))?;
    debug!(path = %path.display(), uid, "owner changed");
    Ok(())
}

const fn rights_from_bits(bits: u32) -> u32 {
    let mut mask = 0;
    if bits & READ != 0 {
        mask |= rights::FILE_GENERIC_READ;
    }
    if bits & WRITE != 0 {
        mask |= rights::FILE_GENERIC_WRITE;
    }
    if bits & EXECUTE != 0 {
        mask |= rights::FILE_GENERIC_EXECUTE;
    }
    mask
}

const fn bits_from_rights(mask: u32) -> u32 {
    let mut bits = 0;
    if mask & rights::READ_DATA != 0 {
        bits |= READ;
    }
    if mask & rights::WRITE_DATA != 0 {
        bits |= WRITE;
    }
    if mask & rights::EXECUTE_FILE != 0 {
        bits |= EXECUTE;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with_mode(dir: &Path, mode: u32) -> anyhow::Result<PathBuf> {
        let path = dir.join("item.txt");
        fs::write(&path, b"data")?;
        fs::set_permissions(&path, Permissions::from_mode(mode))?;
        Ok(path)
    }

    fn mode_of(path: &Path) -> anyhow::Result<u32> {
        Ok(fs::metadata(path)?.mode() & 0o7777)
    }

    fn rule(sid: String, kind: AccessControlType, mask: u32) -> FileSystemAccessRule {
        FileSystemAccessRule {
            identity_reference: sid,
            access_control_type: kind,
            file_system_rights: mask,
            is_inherited: false,
            inheritance_flags: 0,
            propagation_flags: 0,
        }
    }

    #[test]
    fn rights_map_both_ways() {
        for bits in 0..=CLASS_BITS {
            assert_eq!(bits_from_rights(rights_from_bits(bits)), bits);
        }
        assert_eq!(bits_from_rights(rights::FULL_CONTROL), 0o7);
    }

    #[tokio::test]
    async fn load_reports_one_rule_per_class() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = file_with_mode(dir.path(), 0o640)?;
        let metadata = fs::metadata(&path)?;

        let snapshot = PosixPermissionsEngine::new().load(&path, false).await?;
        assert!(snapshot.can_read_file_permissions);
        assert!(snapshot.are_access_rules_protected);
        assert_eq!(
            snapshot.owner_sid,
            Some(Identity::User(metadata.uid()).to_string())
        );
        assert_eq!(snapshot.access_rules.len(), 2);
        assert_eq!(
            snapshot.access_rules[0].file_system_rights,
            rights::FILE_GENERIC_READ | rights::FILE_GENERIC_WRITE
        );
        assert_eq!(
            snapshot.access_rules[1].identity_reference,
            Identity::Group(metadata.gid()).to_string()
        );
        assert_eq!(snapshot.access_rules[1].file_system_rights, rights::FILE_GENERIC_READ);
        Ok(())
    }

    #[tokio::test]
    async fn load_of_missing_path_fails() {
        let result = PosixPermissionsEngine::new()
            .load(Path::new("/definitely/not/here"), false)
            .await;
        assert!(matches!(result, Err(PermissionsError::Io { .. })));
    }

    #[tokio::test]
    async fn apply_folds_rules_into_mode() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = file_with_mode(dir.path(), 0o600)?;
        let engine = PosixPermissionsEngine::new();

        let mut snapshot = engine.load(&path, false).await?;
        let owner = snapshot.owner_sid.clone().unwrap_or_default();
        snapshot.access_rules = vec![
            rule(owner.clone(), AccessControlType::Allow, rights::FULL_CONTROL),
            rule(owner, AccessControlType::Deny, rights::WRITE_DATA),
            rule(Identity::Everyone.to_string(), AccessControlType::Allow, rights::FILE_GENERIC_READ),
        ];
        engine.apply(&snapshot).await?;
        assert_eq!(mode_of(&path)?, 0o504);

        snapshot.access_rules.clear();
        engine.apply(&snapshot).await?;
        assert_eq!(mode_of(&path)?, 0);
        fs::set_permissions(&path, Permissions::from_mode(0o600))?;
        Ok(())
    }

    #[tokio::test]
    async fn apply_rejects_unmapped_identities() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = file_with_mode(dir.path(), 0o644)?;
        let engine = PosixPermissionsEngine::new();

        let mut snapshot = engine.load(&path, false).await?;
        snapshot.access_rules.push(rule(
            "S-1-5-32-544".to_string(),
            AccessControlType::Allow,
            rights::FULL_CONTROL,
        ));
        let result = engine.apply(&snapshot).await;
        assert!(matches!(result, Err(PermissionsError::InvalidSid { .. })));
        assert_eq!(mode_of(&path)?, 0o644);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_snapshot_keeps_previous_owner() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = file_with_mode(dir.path(), 0o640)?;
        let before = fs::metadata(&path)?;
        let engine = PosixPermissionsEngine::new();

        let mut snapshot = engine.load(&path, false).await?;
        let previous_owner = snapshot.owner_sid.clone().unwrap_or_default();
        snapshot.owner_sid = Some(Identity::User(before.uid().wrapping_add(1)).to_string());
        snapshot.access_rules = vec![rule(
            previous_owner,
            AccessControlType::Allow,
            rights::FULL_CONTROL,
        )];

        let result = engine.apply(&snapshot).await;

        assert!(matches!(result, Err(PermissionsError::InvalidSid { .. })));
        let after = fs::metadata(&path)?;
        assert_eq!(after.uid(), before.uid());
        assert_eq!(mode_of(&path)?, 0o640);
        Ok(())
    }

    #[tokio::test]
    async fn set_owner_accepts_user_sids_only() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = file_with_mode(dir.path(), 0o644)?;
        let metadata = fs::metadata(&path)?;
        let engine = PosixPermissionsEngine::new();

        engine
            .set_owner(&path, false, &Identity::User(metadata.uid()).to_string())
            .await?;
        let group = Identity::Group(metadata.gid()).to_string();
        assert!(matches!(
            engine.set_owner(&path, false, &group).await,
            Err(PermissionsError::InvalidSid { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn protection_is_fixed_and_picker_is_absent() -> anyhow::Result<()> {
        let engine = PosixPermissionsEngine::new();
        let path = Path::new("/tmp");
        engine.set_access_rule_protection(path, true, true, false).await?;
        assert!(matches!(
            engine.set_access_rule_protection(path, true, false, true).await,
            Err(PermissionsError::Unsupported { .. })
        ));
        assert_eq!(engine.open_object_picker(0).await?, None);
        Ok(())
    }
}
