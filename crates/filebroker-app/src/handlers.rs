//! One handler per file operation.
//!
//! Expected failures surface as `Success=false` (or all-null fields for
//! shortcut parsing). Only collaborator breakdowns, such as a dead apartment
//! worker, come back as [`AppError`].

use std::path::Path;

use filebroker_fsops::DropEffect;
use filebroker_permissions::PermissionsError;
use filebroker_protocol::{FileOpKind, FileOperation, FilePermissions, LinkWrite, Response, TransferOperation};
use filebroker_shortcut::{LinkSpec, ShortcutRecord, parse_shortcut, write_shortcut};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::services::Services;

/// Response field names.
pub mod fields {
    /// Shortcut target.
    pub const TARGET_PATH: &str = "TargetPath";
    /// Shortcut arguments.
    pub const ARGUMENTS: &str = "Arguments";
    /// Shortcut working directory.
    pub const WORKING_DIRECTORY: &str = "WorkingDirectory";
    /// Shortcut elevation flag.
    pub const RUN_AS_ADMIN: &str = "RunAsAdmin";
    /// Shortcut folder flag.
    pub const IS_FOLDER: &str = "IsFolder";
    /// Serialized permission snapshot.
    pub const FILE_PERMISSIONS: &str = "FilePermissions";
    /// Account chosen in the object picker.
    pub const PICKED_OBJECT: &str = "PickedObject";
}

/// Run `operation`; `None` means the operation sends no response.
pub(crate) async fn handle(
    services: &Services,
    operation: FileOperation,
) -> AppResult<Option<Response>> {
    let response = match operation {
        FileOperation::Clipboard { paths, operation } => {
            services
                .clipboard
                .set_files(paths, drop_effect(operation))
                .await
                .map_err(|err| AppError::fsops("clipboard.set_files", err))?;
            return Ok(None);
        }
        FileOperation::DragDrop { drop_path } => {
            let report = services
                .clipboard
                .receive_drop(&drop_path)
                .await
                .map_err(|err| AppError::fsops("clipboard.receive_drop", err))?;
            debug!(
                drop_path = %drop_path.display(),
                placed = report.placed.len(),
                failures = report.failures,
                "drop received"
            );
            Response::success(report.success())
        }
        FileOperation::DeleteItem { path, permanently } => {
            Response::success(services.shell.delete(&path, permanently).await)
        }
        FileOperation::RenameItem {
            path,
            new_name,
            overwrite,
        } => Response::success(services.shell.rename(&path, &new_name, overwrite).await),
        FileOperation::MoveItem {
            path,
            destination,
            overwrite,
        } => Response::success(services.shell.move_item(&path, &destination, overwrite).await),
        FileOperation::CopyItem {
            path,
            destination,
            overwrite,
        } => Response::success(services.shell.copy(&path, &destination, overwrite).await),
        FileOperation::ParseLink { path } => parse_link(services, &path).await,
        FileOperation::CreateLink(link) => {
            return write_link(services, FileOpKind::CreateLink, link).await;
        }
        FileOperation::UpdateLink(link) => {
            return write_link(services, FileOpKind::UpdateLink, link).await;
        }
        FileOperation::GetFilePermissions { path, is_folder } => {
            let snapshot = match services.permissions.load(&path, is_folder).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "permissions unreadable");
                    FilePermissions::unreadable(path.to_string_lossy(), is_folder)
                }
            };
            let json = serde_json::to_string(&snapshot).map_err(|source| AppError::Encode {
                operation: "permissions.encode",
                source,
            })?;
            Response::new().with(fields::FILE_PERMISSIONS, json)
        }
        FileOperation::SetFilePermissions { permissions } => {
            let result = services.permissions.apply(&permissions).await;
            Response::success(report("permissions.apply", Path::new(&permissions.file_path), result))
        }
        FileOperation::SetFileOwner {
            path,
            is_folder,
            owner_sid,
        } => {
            let result = services
                .permissions
                .set_owner(&path, is_folder, &owner_sid)
                .await;
            Response::success(report("permissions.set_owner", &path, result))
        }
        FileOperation::SetAccessRuleProtection {
            path,
            is_folder,
            is_protected,
            preserve_inheritance,
        } => {
            let result = services
                .permissions
                .set_access_rule_protection(&path, is_folder, is_protected, preserve_inheritance)
                .await;
            Response::success(report("permissions.set_protection", &path, result))
        }
        FileOperation::OpenObjectPicker { hwnd } => {
            let picked = services
                .permissions
                .open_object_picker(hwnd)
                .await
                .unwrap_or_else(|err| {
                    warn!(hwnd, error = %err, "object picker failed");
                    None
                });
            Response::new().with(fields::PICKED_OBJECT, picked)
        }
    };
    Ok(Some(response))
}

const fn drop_effect(operation: TransferOperation) -> DropEffect {
    match operation {
        TransferOperation::Copy => DropEffect::Copy,
        TransferOperation::Move => DropEffect::Move,
    }
}

async fn parse_link(services: &Services, path: &Path) -> Response {
    let record = match parse_shortcut(path, services.link_resolve_timeout).await {
        Ok(record) => record,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "shortcut unreadable");
            ShortcutRecord::default()
        }
    };
    Response::new()
        .with(fields::TARGET_PATH, record.target_path)
        .with(fields::ARGUMENTS, record.arguments)
        .with(fields::WORKING_DIRECTORY, record.working_directory)
        .with(fields::RUN_AS_ADMIN, record.run_as_admin)
        .with(fields::IS_FOLDER, record.is_folder)
}

async fn write_link(
    services: &Services,
    kind: FileOpKind,
    link: LinkWrite,
) -> AppResult<Option<Response>> {
    let LinkWrite {
        path,
        target,
        arguments,
        working_dir,
        run_as_admin,
    } = link;
    let spec = LinkSpec {
        target,
        arguments,
        working_dir,
        run_as_admin,
    };
    let shown_path = path.display().to_string();
    let written = services
        .worker
        .run("shortcut.write", move || write_shortcut(&path, &spec))
        .await
        .map_err(|err| AppError::fsops("shortcut.write", err))?;
    let succeeded = match written {
        Ok(()) => {
            debug!(fileop = %kind, path = %shown_path, "shortcut saved");
            true
        }
        Err(err) => {
            warn!(fileop = %kind, path = %shown_path, error = %err, "shortcut not written");
            false
        }
    };
    Ok(services
        .acknowledge_link_writes
        .then(|| Response::success(succeeded)))
}

fn report(operation: &'static str, path: &Path, result: Result<(), PermissionsError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(operation, path = %path.display(), error = %err, "permission change refused");
            false
        }
    }
}
