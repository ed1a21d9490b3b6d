//! Typed decoding of file-operation request maps.
//!
//! # Design
//! - Requests arrive as loosely typed key/value sets; they are validated once,
//!   here, into one variant per `fileop`.
//! - Requests for other handler families and unknown `fileop` values are not
//!   errors: they decode to [`Decoded::Ignored`] and receive no response.

use std::path::PathBuf;

use crate::error::{DecodeError, DecodeResult};
use crate::permissions::FilePermissions;
use crate::value::{Value, ValueSet};
use crate::{ARGUMENTS_KEY, FILE_OPERATION_ARGUMENT, FILEOP_KEY, REQUEST_ID_KEY};

const PATH_LIST_SEPARATOR: char = '|';

/// Discriminant of a file-operation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOpKind {
    /// Publish paths to the clipboard for copy or move.
    Clipboard,
    /// Receive the clipboard payload into a directory.
    DragDrop,
    /// Delete one item.
    DeleteItem,
    /// Rename one item.
    RenameItem,
    /// Move one item.
    MoveItem,
    /// Copy one item.
    CopyItem,
    /// Read a shortcut.
    ParseLink,
    /// Write a new shortcut.
    CreateLink,
    /// Rewrite an existing shortcut.
    UpdateLink,
    /// Read the permission state of an object.
    GetFilePermissions,
    /// Apply an edited permission state.
    SetFilePermissions,
    /// Change the owner of an object.
    SetFileOwner,
    /// Toggle inheritance protection.
    SetAccessRuleProtection,
    /// Open the account picker.
    OpenObjectPicker,
}

impl FileOpKind {
    const ALL: [Self; 14] = [
        Self::Clipboard,
        Self::DragDrop,
        Self::DeleteItem,
        Self::RenameItem,
        Self::MoveItem,
        Self::CopyItem,
        Self::ParseLink,
        Self::CreateLink,
        Self::UpdateLink,
        Self::GetFilePermissions,
        Self::SetFilePermissions,
        Self::SetFileOwner,
        Self::SetAccessRuleProtection,
        Self::OpenObjectPicker,
    ];

    /// Wire spelling of the discriminant.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clipboard => "Clipboard",
            Self::DragDrop => "DragDrop",
            Self::DeleteItem => "DeleteItem",
            Self::RenameItem => "RenameItem",
            Self::MoveItem => "MoveItem",
            Self::CopyItem => "CopyItem",
            Self::ParseLink => "ParseLink",
            Self::CreateLink => "CreateLink",
            Self::UpdateLink => "UpdateLink",
            Self::GetFilePermissions => "GetFilePermissions",
            Self::SetFilePermissions => "SetFilePermissions",
            Self::SetFileOwner => "SetFileOwner",
            Self::SetAccessRuleProtection => "SetAccessRuleProtection",
            Self::OpenObjectPicker => "OpenObjectPicker",
        }
    }

    /// Parse the wire spelling; matching is exact.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl std::fmt::Display for FileOpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clipboard transfer intent, encoded as the data-package operation ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferOperation {
    /// Paste duplicates the sources.
    Copy,
    /// Paste relocates the sources.
    Move,
}

impl TransferOperation {
    /// Wire ordinal.
    #[must_use]
    pub const fn ordinal(self) -> i64 {
        match self {
            Self::Copy => 1,
            Self::Move => 2,
        }
    }

    /// Decode a wire ordinal.
    #[must_use]
    pub const fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Copy),
            2 => Some(Self::Move),
            _ => None,
        }
    }
}

/// Payload shared by `CreateLink` and `UpdateLink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWrite {
    /// Shortcut file to write (`.lnk` or `.url`).
    pub path: PathBuf,
    /// Target path or URL.
    pub target: String,
    /// Command-line arguments (`.lnk` only).
    pub arguments: Option<String>,
    /// Working directory (`.lnk` only).
    pub working_dir: Option<String>,
    /// Whether the target launches elevated (`.lnk` only).
    pub run_as_admin: bool,
}

/// A validated file-operation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    /// Publish paths to the clipboard.
    Clipboard {
        /// Source paths, in request order.
        paths: Vec<PathBuf>,
        /// Copy or move intent.
        operation: TransferOperation,
    },
    /// Receive the clipboard payload.
    DragDrop {
        /// Destination directory.
        drop_path: PathBuf,
    },
    /// Delete one item.
    DeleteItem {
        /// Item to delete.
        path: PathBuf,
        /// Bypass the recycle store.
        permanently: bool,
    },
    /// Rename one item in place.
    RenameItem {
        /// Item to rename.
        path: PathBuf,
        /// New leaf name.
        new_name: String,
        /// Replace an existing item with the new name.
        overwrite: bool,
    },
    /// Move one item.
    MoveItem {
        /// Item to move.
        path: PathBuf,
        /// Full destination path (folder plus leaf name).
        destination: PathBuf,
        /// Replace an existing destination.
        overwrite: bool,
    },
    /// Copy one item.
    CopyItem {
        /// Item to copy.
        path: PathBuf,
        /// Full destination path (folder plus leaf name).
        destination: PathBuf,
        /// Replace an existing destination.
        overwrite: bool,
    },
    /// Read a shortcut.
    ParseLink {
        /// Shortcut file.
        path: PathBuf,
    },
    /// Write a new shortcut.
    CreateLink(LinkWrite),
    /// Rewrite an existing shortcut.
    UpdateLink(LinkWrite),
    /// Read permission state.
    GetFilePermissions {
        /// Object path.
        path: PathBuf,
        /// Whether the object is a directory.
        is_folder: bool,
    },
    /// Apply permission state.
    SetFilePermissions {
        /// Edited state, including the object path.
        permissions: FilePermissions,
    },
    /// Change the owner.
    SetFileOwner {
        /// Object path.
        path: PathBuf,
        /// Whether the object is a directory.
        is_folder: bool,
        /// New owner security identifier.
        owner_sid: String,
    },
    /// Toggle inheritance protection.
    SetAccessRuleProtection {
        /// Object path.
        path: PathBuf,
        /// Whether the object is a directory.
        is_folder: bool,
        /// Block inherited rules.
        is_protected: bool,
        /// Copy currently inherited rules into explicit rules when protecting.
        preserve_inheritance: bool,
    },
    /// Open the account picker.
    OpenObjectPicker {
        /// Owner window handle.
        hwnd: i64,
    },
}

impl FileOperation {
    /// Discriminant of the operation.
    #[must_use]
    pub const fn kind(&self) -> FileOpKind {
        match self {
            Self::Clipboard { .. } => FileOpKind::Clipboard,
            Self::DragDrop { .. } => FileOpKind::DragDrop,
            Self::DeleteItem { .. } => FileOpKind::DeleteItem,
            Self::RenameItem { .. } => FileOpKind::RenameItem,
            Self::MoveItem { .. } => FileOpKind::MoveItem,
            Self::CopyItem { .. } => FileOpKind::CopyItem,
            Self::ParseLink { .. } => FileOpKind::ParseLink,
            Self::CreateLink(_) => FileOpKind::CreateLink,
            Self::UpdateLink(_) => FileOpKind::UpdateLink,
            Self::GetFilePermissions { .. } => FileOpKind::GetFilePermissions,
            Self::SetFilePermissions { .. } => FileOpKind::SetFilePermissions,
            Self::SetFileOwner { .. } => FileOpKind::SetFileOwner,
            Self::SetAccessRuleProtection { .. } => FileOpKind::SetAccessRuleProtection,
            Self::OpenObjectPicker { .. } => FileOpKind::OpenObjectPicker,
        }
    }
}

/// A decoded request together with its correlation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Caller-supplied correlation token, echoed on the response.
    pub request_id: Option<String>,
    /// The operation to perform.
    pub operation: FileOperation,
}

/// Why a request was passed over without a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The request belongs to another handler family.
    OtherArguments(Option<String>),
    /// The `fileop` value is not one this broker handles.
    UnknownFileOp(String),
}

/// Outcome of decoding a request map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A file operation to dispatch.
    Operation(Envelope),
    /// A request to pass over silently.
    Ignored(IgnoreReason),
}

/// Decode a request map into a typed file operation.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field the selected operation needs is
/// missing, has the wrong type, or carries an unusable value.
pub fn decode(message: &ValueSet) -> DecodeResult<Decoded> {
    let fields = Fields(message);
    let arguments = fields.optional_string(ARGUMENTS_KEY)?;
    if arguments.as_deref() != Some(FILE_OPERATION_ARGUMENT) {
        return Ok(Decoded::Ignored(IgnoreReason::OtherArguments(arguments)));
    }

    let fileop = fields.optional_string(FILEOP_KEY)?.unwrap_or_default();
    let Some(kind) = FileOpKind::parse(&fileop) else {
        return Ok(Decoded::Ignored(IgnoreReason::UnknownFileOp(fileop)));
    };

    let request_id = fields.optional_string(REQUEST_ID_KEY)?;
    let operation = decode_operation(kind, &fields)?;
    Ok(Decoded::Operation(Envelope {
        request_id,
        operation,
    }))
}

fn decode_operation(kind: FileOpKind, fields: &Fields<'_>) -> DecodeResult<FileOperation> {
    let operation = match kind {
        FileOpKind::Clipboard => {
            let joined = fields.string("filepath")?;
            let paths: Vec<PathBuf> = joined
                .split(PATH_LIST_SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(PathBuf::from)
                .collect();
            if paths.is_empty() {
                return Err(DecodeError::InvalidValue {
                    field: "filepath",
                    reason: "empty_path_list",
                    value: Some(joined),
                });
            }
            let ordinal = fields.integer("operation")?;
            let operation = TransferOperation::from_ordinal(ordinal).ok_or_else(|| {
                DecodeError::InvalidValue {
                    field: "operation",
                    reason: "unsupported_ordinal",
                    value: Some(ordinal.to_string()),
                }
            })?;
            FileOperation::Clipboard { paths, operation }
        }
        FileOpKind::DragDrop => FileOperation::DragDrop {
            drop_path: fields.path("droppath")?,
        },
        FileOpKind::DeleteItem => FileOperation::DeleteItem {
            path: fields.path("filepath")?,
            permanently: fields.boolean("permanently")?,
        },
        FileOpKind::RenameItem => {
            let new_name = fields.string("newName")?;
            if new_name.trim().is_empty() {
                return Err(DecodeError::InvalidValue {
                    field: "newName",
                    reason: "empty",
                    value: None,
                });
            }
            FileOperation::RenameItem {
                path: fields.path("filepath")?,
                new_name,
                overwrite: fields.boolean("overwrite")?,
            }
        }
        FileOpKind::MoveItem => FileOperation::MoveItem {
            path: fields.path("filepath")?,
            destination: fields.path("destpath")?,
            overwrite: fields.boolean("overwrite")?,
        },
        FileOpKind::CopyItem => FileOperation::CopyItem {
            path: fields.path("filepath")?,
            destination: fields.path("destpath")?,
            overwrite: fields.boolean("overwrite")?,
        },
        FileOpKind::ParseLink => FileOperation::ParseLink {
            path: fields.path("filepath")?,
        },
        FileOpKind::CreateLink => FileOperation::CreateLink(decode_link_write(fields)?),
        FileOpKind::UpdateLink => FileOperation::UpdateLink(decode_link_write(fields)?),
        FileOpKind::GetFilePermissions => FileOperation::GetFilePermissions {
            path: fields.path("filepath")?,
            is_folder: fields.boolean("isfolder")?,
        },
        FileOpKind::SetFilePermissions => {
            let raw = fields.string("permissions")?;
            let permissions = serde_json::from_str(&raw).map_err(|source| {
                DecodeError::MalformedJson {
                    field: "permissions",
                    source,
                }
            })?;
            FileOperation::SetFilePermissions { permissions }
        }
        FileOpKind::SetFileOwner => FileOperation::SetFileOwner {
            path: fields.path("filepath")?,
            is_folder: fields.boolean("isfolder")?,
            owner_sid: fields.string("ownersid")?,
        },
        FileOpKind::SetAccessRuleProtection => FileOperation::SetAccessRuleProtection {
            path: fields.path("filepath")?,
            is_folder: fields.boolean("isfolder")?,
            is_protected: fields.boolean("isprotected")?,
            preserve_inheritance: fields.boolean("preserveinheritance")?,
        },
        FileOpKind::OpenObjectPicker => FileOperation::OpenObjectPicker {
            hwnd: fields.integer("HWND")?,
        },
    };
    Ok(operation)
}

fn decode_link_write(fields: &Fields<'_>) -> DecodeResult<LinkWrite> {
    Ok(LinkWrite {
        path: fields.path("filepath")?,
        target: fields.string("targetpath")?,
        arguments: fields.optional_string("arguments")?,
        working_dir: fields.optional_string("workingdir")?,
        run_as_admin: fields.optional_boolean("runasadmin")?.unwrap_or(false),
    })
}

struct Fields<'a>(&'a ValueSet);

impl Fields<'_> {
    fn present(&self, field: &'static str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    fn required(&self, field: &'static str) -> DecodeResult<&Value> {
        self.present(field)
            .ok_or(DecodeError::MissingField { field })
    }

    fn string(&self, field: &'static str) -> DecodeResult<String> {
        let value = self.required(field)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| wrong_type(field, "string", value))
    }

    fn optional_string(&self, field: &'static str) -> DecodeResult<Option<String>> {
        self.present(field)
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| wrong_type(field, "string", value))
            })
            .transpose()
    }

    fn path(&self, field: &'static str) -> DecodeResult<PathBuf> {
        let value = self.string(field)?;
        if value.is_empty() {
            return Err(DecodeError::InvalidValue {
                field,
                reason: "empty",
                value: None,
            });
        }
        Ok(PathBuf::from(value))
    }

    fn boolean(&self, field: &'static str) -> DecodeResult<bool> {
        let value = self.required(field)?;
        value
            .as_bool()
            .ok_or_else(|| wrong_type(field, "bool", value))
    }

    fn optional_boolean(&self, field: &'static str) -> DecodeResult<Option<bool>> {
        self.present(field)
            .map(|value| value.as_bool().ok_or_else(|| wrong_type(field, "bool", value)))
            .transpose()
    }

    fn integer(&self, field: &'static str) -> DecodeResult<i64> {
        let value = self.required(field)?;
        value
            .as_i64()
            .ok_or_else(|| wrong_type(field, "integer", value))
    }
}

const fn wrong_type(field: &'static str, expected: &'static str, value: &Value) -> DecodeError {
    DecodeError::WrongType {
        field,
        expected,
        found: value.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_operation(fileop: &str) -> ValueSet {
        ValueSet::new()
            .with(ARGUMENTS_KEY, FILE_OPERATION_ARGUMENT)
            .with(FILEOP_KEY, fileop)
    }

    #[test]
    fn delete_request_decodes_with_request_id() -> anyhow::Result<()> {
        let message = file_operation("DeleteItem")
            .with("filepath", r"C:\tmp\a.txt")
            .with("permanently", false)
            .with(REQUEST_ID_KEY, "r1");

        let Decoded::Operation(envelope) = decode(&message)? else {
            anyhow::bail!("expected an operation");
        };
        assert_eq!(envelope.request_id.as_deref(), Some("r1"));
        assert_eq!(
            envelope.operation,
            FileOperation::DeleteItem {
                path: PathBuf::from(r"C:\tmp\a.txt"),
                permanently: false,
            }
        );
        Ok(())
    }

    #[test]
    fn other_argument_families_are_ignored() -> anyhow::Result<()> {
        let message = ValueSet::new().with(ARGUMENTS_KEY, "Bitlocker");
        assert_eq!(
            decode(&message)?,
            Decoded::Ignored(IgnoreReason::OtherArguments(Some("Bitlocker".to_string())))
        );
        Ok(())
    }

    #[test]
    fn unknown_and_missing_fileop_are_ignored() -> anyhow::Result<()> {
        assert_eq!(
            decode(&file_operation("Defragment"))?,
            Decoded::Ignored(IgnoreReason::UnknownFileOp("Defragment".to_string()))
        );
        let message = ValueSet::new().with(ARGUMENTS_KEY, FILE_OPERATION_ARGUMENT);
        assert_eq!(
            decode(&message)?,
            Decoded::Ignored(IgnoreReason::UnknownFileOp(String::new()))
        );
        Ok(())
    }

    #[test]
    fn wrong_types_name_the_field() {
        let message = file_operation("CopyItem")
            .with("filepath", "/a")
            .with("destpath", "/b")
            .with("overwrite", "yes");
        let err = decode(&message).expect_err("string overwrite must fail");
        assert!(matches!(
            err,
            DecodeError::WrongType {
                field: "overwrite",
                expected: "bool",
                found: "string",
            }
        ));
    }

    #[test]
    fn missing_and_null_fields_are_missing() {
        let message = file_operation("MoveItem")
            .with("filepath", "/a")
            .with("destpath", Value::Null)
            .with("overwrite", true);
        let err = decode(&message).expect_err("null destpath must fail");
        assert!(matches!(err, DecodeError::MissingField { field: "destpath" }));
    }

    #[test]
    fn clipboard_splits_paths_and_decodes_ordinal() -> anyhow::Result<()> {
        let message = file_operation("Clipboard")
            .with("filepath", "/a.txt||/b")
            .with("operation", 2_i64);
        let Decoded::Operation(envelope) = decode(&message)? else {
            anyhow::bail!("expected an operation");
        };
        assert_eq!(
            envelope.operation,
            FileOperation::Clipboard {
                paths: vec![PathBuf::from("/a.txt"), PathBuf::from("/b")],
                operation: TransferOperation::Move,
            }
        );
        assert_eq!(envelope.request_id, None);

        let link = file_operation("Clipboard")
            .with("filepath", "/a.txt")
            .with("operation", 4_i64);
        assert!(matches!(
            decode(&link),
            Err(DecodeError::InvalidValue {
                field: "operation",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn link_writes_tolerate_absent_lnk_fields() -> anyhow::Result<()> {
        let message = file_operation("UpdateLink")
            .with("filepath", "/home/u/site.url")
            .with("targetpath", "www.example.com");
        let Decoded::Operation(envelope) = decode(&message)? else {
            anyhow::bail!("expected an operation");
        };
        let FileOperation::UpdateLink(write) = envelope.operation else {
            anyhow::bail!("expected UpdateLink");
        };
        assert_eq!(write.arguments, None);
        assert_eq!(write.working_dir, None);
        assert!(!write.run_as_admin);
        Ok(())
    }

    #[test]
    fn set_permissions_parses_embedded_json() {
        let message = file_operation("SetFilePermissions").with("permissions", "{not json");
        assert!(matches!(
            decode(&message),
            Err(DecodeError::MalformedJson {
                field: "permissions",
                ..
            })
        ));
    }

    #[test]
    fn kinds_round_trip_through_wire_names() {
        for kind in FileOpKind::ALL {
            assert_eq!(FileOpKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FileOpKind::parse("deleteitem"), None);
    }
}
