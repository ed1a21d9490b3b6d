//! Permission payloads exchanged by the permission operations.
//!
//! The UI edits these objects and sends them back verbatim, so field names use
//! the `PascalCase` spelling the client already serializes.

use serde::{Deserialize, Serialize};

/// Access-control state of one filesystem object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilePermissions {
    /// Path of the object the state was read from.
    pub file_path: String,
    /// Whether the object is a directory.
    pub is_folder: bool,
    /// Owner security identifier, when it could be read.
    pub owner_sid: Option<String>,
    /// Whether inherited rules are blocked.
    pub are_access_rules_protected: bool,
    /// Whether the security descriptor could be read at all.
    pub can_read_file_permissions: bool,
    /// Explicit and inherited access rules.
    #[serde(default)]
    pub access_rules: Vec<FileSystemAccessRule>,
}

impl FilePermissions {
    /// State reported when the descriptor cannot be read.
    #[must_use]
    pub fn unreadable(file_path: impl Into<String>, is_folder: bool) -> Self {
        Self {
            file_path: file_path.into(),
            is_folder,
            owner_sid: None,
            are_access_rules_protected: false,
            can_read_file_permissions: false,
            access_rules: Vec::new(),
        }
    }
}

/// Allow or deny semantics of an access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessControlType {
    /// Grants the listed rights.
    Allow,
    /// Revokes the listed rights, taking precedence over allow rules.
    Deny,
}

/// One access-control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileSystemAccessRule {
    /// Security identifier the rule applies to.
    pub identity_reference: String,
    /// Allow or deny.
    pub access_control_type: AccessControlType,
    /// Rights mask, see [`rights`].
    pub file_system_rights: u32,
    /// Whether the rule was inherited from a parent container.
    #[serde(default)]
    pub is_inherited: bool,
    /// Container/object inheritance flags.
    #[serde(default)]
    pub inheritance_flags: u32,
    /// Propagation flags.
    #[serde(default)]
    pub propagation_flags: u32,
}

/// File-system rights masks.
pub mod rights {
    /// Generic read: data, attributes, extended attributes, security, synchronize.
    pub const FILE_GENERIC_READ: u32 = 0x0012_0089;
    /// Generic write: data, append, attributes, extended attributes, security, synchronize.
    pub const FILE_GENERIC_WRITE: u32 = 0x0012_0116;
    /// Generic execute: traverse, attributes, security, synchronize.
    pub const FILE_GENERIC_EXECUTE: u32 = 0x0012_00A0;
    /// Every right.
    pub const FULL_CONTROL: u32 = 0x001F_01FF;

    /// Bits that distinguish read from the shared synchronize/attribute bits.
    pub const READ_DATA: u32 = 0x0000_0001;
    /// Bits that distinguish write from the shared bits.
    pub const WRITE_DATA: u32 = 0x0000_0002;
    /// Bits that distinguish execute from the shared bits.
    pub const EXECUTE_FILE: u32 = 0x0000_0020;
}
