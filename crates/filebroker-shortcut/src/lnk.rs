//! Binary shell-link (`.lnk`) codec.
//!
//! # Design
//! - Decoding walks header, optional target ID list (skipped), link info,
//!   string data and extra data blocks, bounds-checking every read.
//! - Encoding writes a unicode link with a link-info block for the target, so
//!   the output round-trips through [`decode`].

use chrono::{DateTime, Utc};

use crate::error::{ShortcutError, ShortcutResult};

const HEADER_SIZE: u32 = 0x4C;
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];
const LINK_INFO_HEADER_UNICODE: u32 = 0x24;
const LINK_INFO_HEADER_ANSI: u32 = 0x1C;
const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 0x1;
const COMMON_NETWORK_RELATIVE_LINK: u32 = 0x2;
const DRIVE_FIXED: u32 = 3;
const ENVIRONMENT_BLOCK_SIGNATURE: u32 = 0xA000_0001;
const ENVIRONMENT_ANSI_LEN: usize = 260;
const ENVIRONMENT_UNICODE_LEN: usize = 520;
const SW_SHOWNORMAL: u32 = 1;
const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x20;
const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;
const FILETIME_UNIX_EPOCH_SECONDS: i64 = 11_644_473_600;

/// Link flags bitfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkFlags(pub u32);

impl LinkFlags {
    /// A target ID list follows the header.
    pub const HAS_LINK_TARGET_ID_LIST: u32 = 0x0000_0001;
    /// A link info block is present.
    pub const HAS_LINK_INFO: u32 = 0x0000_0002;
    /// Description string present.
    pub const HAS_NAME: u32 = 0x0000_0004;
    /// Relative path string present.
    pub const HAS_RELATIVE_PATH: u32 = 0x0000_0008;
    /// Working directory string present.
    pub const HAS_WORKING_DIR: u32 = 0x0000_0010;
    /// Arguments string present.
    pub const HAS_ARGUMENTS: u32 = 0x0000_0020;
    /// Icon location string present.
    pub const HAS_ICON_LOCATION: u32 = 0x0000_0040;
    /// Strings are UTF-16LE.
    pub const IS_UNICODE: u32 = 0x0000_0080;
    /// Ignore the link info block.
    pub const FORCE_NO_LINK_INFO: u32 = 0x0000_0100;
    /// An environment-variables block is present.
    pub const HAS_EXP_STRING: u32 = 0x0000_0200;
    /// Launch the target elevated.
    pub const RUN_AS_USER: u32 = 0x0000_2000;

    /// Whether `flag` is set.
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    const fn set(&mut self, flag: u32, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Location information for the link target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkInfo {
    /// Local path prefix of the target.
    pub local_base_path: Option<String>,
    /// Network share name when the target is remote.
    pub network_share: Option<String>,
    /// Remainder of the path after the base or share.
    pub common_path_suffix: Option<String>,
}

impl LinkInfo {
    /// Full target path described by this block.
    #[must_use]
    pub fn target_path(&self) -> Option<String> {
        let suffix = self.common_path_suffix.as_deref().unwrap_or_default();
        if let Some(base) = self.local_base_path.as_deref().filter(|b| !b.is_empty()) {
            return Some(format!("{base}{suffix}"));
        }
        let share = self.network_share.as_deref().filter(|s| !s.is_empty())?;
        if suffix.is_empty() {
            return Some(share.to_string());
        }
        let separator = if share.ends_with('\\') || suffix.starts_with('\\') { "" } else { "\\" };
        Some(format!("{share}{separator}{suffix}"))
    }
}

/// A decoded or to-be-encoded shell link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellLink {
    /// Link flags.
    pub flags: LinkFlags,
    /// Target file attributes recorded in the header.
    pub file_attributes: u32,
    /// Target creation time.
    pub creation_time: Option<DateTime<Utc>>,
    /// Target access time.
    pub access_time: Option<DateTime<Utc>>,
    /// Target write time.
    pub write_time: Option<DateTime<Utc>>,
    /// Target size, saturated to 32 bits.
    pub file_size: u32,
    /// Icon index.
    pub icon_index: i32,
    /// Window show command.
    pub show_command: u32,
    /// Link info block.
    pub link_info: Option<LinkInfo>,
    /// Description.
    pub name: Option<String>,
    /// Target path relative to the link.
    pub relative_path: Option<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Command-line arguments.
    pub arguments: Option<String>,
    /// Icon location.
    pub icon_location: Option<String>,
    /// Target from the environment-variables extra block.
    pub environment_target: Option<String>,
}

impl ShellLink {
    /// Link pointing at `target`, shown normally, with no string data.
    #[must_use]
    pub fn for_target(target: &str) -> Self {
        let mut link = Self {
            show_command: SW_SHOWNORMAL,
            file_attributes: FILE_ATTRIBUTE_ARCHIVE,
            ..Self::default()
        };
        if !target.is_empty() {
            link.link_info = Some(LinkInfo {
                local_base_path: Some(target.to_string()),
                network_share: None,
                common_path_suffix: None,
            });
        }
        link
    }

    /// Target path from link info, falling back to the environment block.
    #[must_use]
    pub fn target_path(&self) -> Option<String> {
        self.link_info
            .as_ref()
            .and_then(LinkInfo::target_path)
            .or_else(|| self.environment_target.clone())
            .filter(|target| !target.is_empty())
    }

    /// Whether the link launches its target elevated.
    #[must_use]
    pub const fn run_as_admin(&self) -> bool {
        self.flags.has(LinkFlags::RUN_AS_USER)
    }

    /// Mark the link to launch elevated.
    pub const fn set_run_as_admin(&mut self, on: bool) {
        self.flags.set(LinkFlags::RUN_AS_USER, on);
    }

    /// Whether the header records a directory target.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.file_attributes & FILE_ATTRIBUTE_DIRECTORY != 0
    }

    /// Record whether the target is a directory.
    pub const fn set_directory(&mut self, is_dir: bool) {
        if is_dir {
            self.file_attributes = (self.file_attributes & !FILE_ATTRIBUTE_ARCHIVE) | FILE_ATTRIBUTE_DIRECTORY;
        } else {
            self.file_attributes &= !FILE_ATTRIBUTE_DIRECTORY;
        }
    }
}

/// Decode a shell link.
///
/// # Errors
///
/// Returns [`ShortcutError::InvalidHeader`] for a foreign header and
/// [`ShortcutError::Truncated`] when a structure runs past the data.
pub fn decode(bytes: &[u8]) -> ShortcutResult<ShellLink> {
    let mut reader = Reader::new(bytes);
    let header_size = reader.u32("header")?;
    if header_size != HEADER_SIZE {
        return Err(ShortcutError::InvalidHeader {
            field: "header_size",
            value: u64::from(header_size),
        });
    }
    if reader.take(16, "header")? != LINK_CLSID {
        return Err(ShortcutError::InvalidHeader {
            field: "clsid",
            value: 0,
        });
    }
    let flags = LinkFlags(reader.u32("header")?);
    let mut link = ShellLink {
        flags,
        file_attributes: reader.u32("header")?,
        creation_time: from_filetime(reader.u64("header")?),
        access_time: from_filetime(reader.u64("header")?),
        write_time: from_filetime(reader.u64("header")?),
        file_size: reader.u32("header")?,
        icon_index: i32::from_le_bytes(reader.array("header")?),
        show_command: reader.u32("header")?,
        ..ShellLink::default()
    };
    // hotkey and reserved fields
    reader.take(12, "header")?;

    if flags.has(LinkFlags::HAS_LINK_TARGET_ID_LIST) {
        let size = usize::from(reader.u16("id_list")?);
        reader.take(size, "id_list")?;
    }

    if flags.has(LinkFlags::HAS_LINK_INFO) {
        let start = reader.position();
        let size = reader.u32("link_info")? as usize;
        let block = reader.slice(start, size, "link_info")?;
        reader.seek(start + size);
        if !flags.has(LinkFlags::FORCE_NO_LINK_INFO) {
            link.link_info = Some(decode_link_info(block, start)?);
        }
    }

    let unicode = flags.has(LinkFlags::IS_UNICODE);
    link.name = read_string_if(&mut reader, flags, LinkFlags::HAS_NAME, unicode)?;
    link.relative_path = read_string_if(&mut reader, flags, LinkFlags::HAS_RELATIVE_PATH, unicode)?;
    link.working_dir = read_string_if(&mut reader, flags, LinkFlags::HAS_WORKING_DIR, unicode)?;
    link.arguments = read_string_if(&mut reader, flags, LinkFlags::HAS_ARGUMENTS, unicode)?;
    link.icon_location = read_string_if(&mut reader, flags, LinkFlags::HAS_ICON_LOCATION, unicode)?;

    while reader.remaining() >= 4 {
        let start = reader.position();
        let size = reader.u32("extra_data")? as usize;
        if size < 4 {
            break;
        }
        let block = reader.slice(start, size, "extra_data")?;
        reader.seek(start + size);
        let mut block_reader = Reader::new(block);
        block_reader.take(4, "extra_data")?;
        if block_reader.u32("extra_data")? == ENVIRONMENT_BLOCK_SIGNATURE {
            let ansi = block_reader.take(ENVIRONMENT_ANSI_LEN, "environment_block")?;
            let wide = block_reader.take(ENVIRONMENT_UNICODE_LEN, "environment_block")?;
            link.environment_target = Some(utf16_until_nul(wide))
                .filter(|s| !s.is_empty())
                .or_else(|| Some(ansi_until_nul(ansi)).filter(|s| !s.is_empty()));
        }
    }

    Ok(link)
}

/// Encode a shell link.
#[must_use]
pub fn encode(link: &ShellLink) -> Vec<u8> {
    let mut flags = link.flags;
    flags.set(LinkFlags::HAS_LINK_TARGET_ID_LIST, false);
    flags.set(LinkFlags::FORCE_NO_LINK_INFO, false);
    flags.set(LinkFlags::HAS_EXP_STRING, false);
    flags.set(LinkFlags::IS_UNICODE, true);
    flags.set(LinkFlags::HAS_LINK_INFO, link.link_info.is_some());
    flags.set(LinkFlags::HAS_NAME, link.name.is_some());
    flags.set(LinkFlags::HAS_RELATIVE_PATH, link.relative_path.is_some());
    flags.set(LinkFlags::HAS_WORKING_DIR, link.working_dir.is_some());
    flags.set(LinkFlags::HAS_ARGUMENTS, link.arguments.is_some());
    flags.set(LinkFlags::HAS_ICON_LOCATION, link.icon_location.is_some());

    let mut out = Vec::with_capacity(256);
    put_u32(&mut out, HEADER_SIZE);
    out.extend_from_slice(&LINK_CLSID);
    put_u32(&mut out, flags.0);
    put_u32(&mut out, link.file_attributes);
    put_u64(&mut out, to_filetime(link.creation_time));
    put_u64(&mut out, to_filetime(link.access_time));
    put_u64(&mut out, to_filetime(link.write_time));
    put_u32(&mut out, link.file_size);
    out.extend_from_slice(&link.icon_index.to_le_bytes());
    put_u32(&mut out, link.show_command);
    out.extend_from_slice(&[0; 12]);

    if let Some(info) = &link.link_info {
        out.extend_from_slice(&encode_link_info(info));
    }

    for value in [
        &link.name,
        &link.relative_path,
        &link.working_dir,
        &link.arguments,
        &link.icon_location,
    ]
    .into_iter()
    .flatten()
    {
        let units: Vec<u16> = value.encode_utf16().take(usize::from(u16::MAX)).collect();
        put_u16(&mut out, u16::try_from(units.len()).unwrap_or(u16::MAX));
        for unit in units {
            put_u16(&mut out, unit);
        }
    }

    put_u32(&mut out, 0);
    out
}

fn decode_link_info(block: &[u8], base_offset: usize) -> ShortcutResult<LinkInfo> {
    let mut reader = Reader::new(block);
    reader.take(4, "link_info")?;
    let header_size = reader.u32("link_info")?;
    if header_size < LINK_INFO_HEADER_ANSI {
        return Err(ShortcutError::InvalidHeader {
            field: "link_info_header_size",
            value: u64::from(header_size),
        });
    }
    let info_flags = reader.u32("link_info")?;
    let _volume_id_offset = reader.u32("link_info")?;
    let local_base_offset = reader.u32("link_info")? as usize;
    let network_offset = reader.u32("link_info")? as usize;
    let suffix_offset = reader.u32("link_info")? as usize;
    let (local_base_unicode, suffix_unicode) = if header_size >= LINK_INFO_HEADER_UNICODE {
        (
            Some(reader.u32("link_info")? as usize),
            Some(reader.u32("link_info")? as usize),
        )
    } else {
        (None, None)
    };

    let string_at = |ansi: usize, wide: Option<usize>| -> ShortcutResult<Option<String>> {
        match wide.filter(|offset| *offset != 0) {
            Some(offset) => cstr16_at(block, offset, base_offset).map(Some),
            None if ansi != 0 => cstr_at(block, ansi, base_offset).map(Some),
            None => Ok(None),
        }
    };

    let mut info = LinkInfo::default();
    if info_flags & VOLUME_ID_AND_LOCAL_BASE_PATH != 0 {
        info.local_base_path = string_at(local_base_offset, local_base_unicode)?;
    }
    if info_flags & COMMON_NETWORK_RELATIVE_LINK != 0 && network_offset != 0 {
        info.network_share = Some(decode_network_link(block, network_offset, base_offset)?);
    }
    info.common_path_suffix = string_at(suffix_offset, suffix_unicode)?.filter(|s| !s.is_empty());
    Ok(info)
}

fn decode_network_link(block: &[u8], offset: usize, base_offset: usize) -> ShortcutResult<String> {
    let mut reader = Reader::new(block);
    reader.seek(offset);
    let _size = reader.u32("network_link")?;
    let _flags = reader.u32("network_link")?;
    let net_name_offset = reader.u32("network_link")? as usize;
    let _device_name_offset = reader.u32("network_link")?;
    let _provider = reader.u32("network_link")?;
    if net_name_offset > 0x14 {
        let net_name_unicode = reader.u32("network_link")? as usize;
        return cstr16_at(block, offset + net_name_unicode, base_offset);
    }
    cstr_at(block, offset + net_name_offset, base_offset)
}

fn encode_link_info(info: &LinkInfo) -> Vec<u8> {
    let local = info.local_base_path.as_deref().unwrap_or_default();
    let suffix = info.common_path_suffix.as_deref().unwrap_or_default();

    let mut volume = Vec::new();
    put_u32(&mut volume, 0x11);
    put_u32(&mut volume, DRIVE_FIXED);
    put_u32(&mut volume, 0);
    put_u32(&mut volume, 0x10);
    volume.push(0);

    let volume_offset = LINK_INFO_HEADER_UNICODE as usize;
    let local_offset = volume_offset + volume.len();
    let local_ansi = ansi_bytes(local);
    let suffix_offset = local_offset + local_ansi.len();
    let suffix_ansi = ansi_bytes(suffix);
    let local_unicode_offset = suffix_offset + suffix_ansi.len();
    let local_wide = wide_bytes(local);
    let suffix_unicode_offset = local_unicode_offset + local_wide.len();
    let suffix_wide = wide_bytes(suffix);
    let total = suffix_unicode_offset + suffix_wide.len();

    let mut out = Vec::with_capacity(total);
    put_u32(&mut out, u32::try_from(total).unwrap_or(u32::MAX));
    put_u32(&mut out, LINK_INFO_HEADER_UNICODE);
    put_u32(&mut out, VOLUME_ID_AND_LOCAL_BASE_PATH);
    for offset in [volume_offset, local_offset, 0, suffix_offset, local_unicode_offset, suffix_unicode_offset] {
        put_u32(&mut out, u32::try_from(offset).unwrap_or(u32::MAX));
    }
    out.extend_from_slice(&volume);
    out.extend_from_slice(&local_ansi);
    out.extend_from_slice(&suffix_ansi);
    out.extend_from_slice(&local_wide);
    out.extend_from_slice(&suffix_wide);
    out
}

fn read_string_if(
    reader: &mut Reader<'_>,
    flags: LinkFlags,
    flag: u32,
    unicode: bool,
) -> ShortcutResult<Option<String>> {
    if !flags.has(flag) {
        return Ok(None);
    }
    let count = usize::from(reader.u16("string_data")?);
    if unicode {
        let bytes = reader.take(count * 2, "string_data")?;
        Ok(Some(utf16_until_nul(bytes)))
    } else {
        let bytes = reader.take(count, "string_data")?;
        Ok(Some(ansi_until_nul(bytes)))
    }
}

fn cstr_at(block: &[u8], offset: usize, base: usize) -> ShortcutResult<String> {
    let tail = block.get(offset..).ok_or(ShortcutError::Truncated {
        structure: "link_info",
        offset: base + offset,
    })?;
    let end = tail.iter().position(|b| *b == 0).ok_or(ShortcutError::Truncated {
        structure: "link_info",
        offset: base + block.len(),
    })?;
    Ok(ansi_until_nul(&tail[..end]))
}

fn cstr16_at(block: &[u8], offset: usize, base: usize) -> ShortcutResult<String> {
    let tail = block.get(offset..).ok_or(ShortcutError::Truncated {
        structure: "link_info",
        offset: base + offset,
    })?;
    let terminated = tail
        .chunks_exact(2)
        .any(|pair| pair == [0, 0]);
    if !terminated {
        return Err(ShortcutError::Truncated {
            structure: "link_info",
            offset: base + block.len(),
        });
    }
    Ok(utf16_until_nul(tail))
}

fn utf16_until_nul(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Single-byte strings are read as Latin-1.
fn ansi_until_nul(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| char::from(*b))
        .collect()
}

fn ansi_bytes(value: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    bytes.push(0);
    bytes
}

fn wide_bytes(value: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

fn from_filetime(ticks: u64) -> Option<DateTime<Utc>> {
    if ticks == 0 {
        return None;
    }
    let seconds = i64::try_from(ticks / FILETIME_TICKS_PER_SECOND).ok()? - FILETIME_UNIX_EPOCH_SECONDS;
    let nanos = u32::try_from((ticks % FILETIME_TICKS_PER_SECOND) * 100).ok()?;
    DateTime::from_timestamp(seconds, nanos)
}

fn to_filetime(time: Option<DateTime<Utc>>) -> u64 {
    let Some(time) = time else {
        return 0;
    };
    time.timestamp()
        .checked_add(FILETIME_UNIX_EPOCH_SECONDS)
        .and_then(|seconds| u64::try_from(seconds).ok())
        .and_then(|seconds| seconds.checked_mul(FILETIME_TICKS_PER_SECOND))
        .and_then(|ticks| ticks.checked_add(u64::from(time.timestamp_subsec_nanos() / 100)))
        .unwrap_or(0)
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    const fn position(&self) -> usize {
        self.position
    }

    const fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    const fn seek(&mut self, position: usize) {
        self.position = position;
    }

    fn slice(&self, start: usize, len: usize, structure: &'static str) -> ShortcutResult<&'a [u8]> {
        start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(ShortcutError::Truncated {
                structure,
                offset: start,
            })
    }

    fn take(&mut self, len: usize, structure: &'static str) -> ShortcutResult<&'a [u8]> {
        let bytes = self.slice(self.position, len, structure)?;
        self.position += len;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self, structure: &'static str) -> ShortcutResult<[u8; N]> {
        let bytes = self.take(N, structure)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u16(&mut self, structure: &'static str) -> ShortcutResult<u16> {
        self.array(structure).map(u16::from_le_bytes)
    }

    fn u32(&mut self, structure: &'static str) -> ShortcutResult<u32> {
        self.array(structure).map(u32::from_le_bytes)
    }

    fn u64(&mut self, structure: &'static str) -> ShortcutResult<u64> {
        self.array(structure).map(u64::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ShellLink {
        let mut link = ShellLink::for_target(r"C:\Tools\app.exe");
        link.arguments = Some("--verbose \"x y\"".to_string());
        link.working_dir = Some(r"C:\Tools".to_string());
        link.write_time = Utc.with_ymd_and_hms(2023, 5, 17, 8, 30, 0).single();
        link.file_size = 4096;
        link.set_run_as_admin(true);
        link
    }

    #[test]
    fn encoded_link_decodes_to_same_fields() -> anyhow::Result<()> {
        let link = sample();
        let bytes = encode(&link);
        assert_eq!(&bytes[..4], &[0x4C, 0, 0, 0]);
        assert_eq!(&bytes[4..20], &LINK_CLSID);

        let decoded = decode(&bytes)?;
        assert_eq!(decoded.target_path().as_deref(), Some(r"C:\Tools\app.exe"));
        assert_eq!(decoded.arguments, link.arguments);
        assert_eq!(decoded.working_dir, link.working_dir);
        assert_eq!(decoded.write_time, link.write_time);
        assert_eq!(decoded.file_size, 4096);
        assert!(decoded.run_as_admin());
        assert!(!decoded.is_directory());
        assert!(decoded.flags.has(LinkFlags::IS_UNICODE));
        Ok(())
    }

    #[test]
    fn directory_attribute_round_trips() -> anyhow::Result<()> {
        let mut link = ShellLink::for_target("/srv/share");
        link.set_directory(true);
        let decoded = decode(&encode(&link))?;
        assert!(decoded.is_directory());
        assert!(!decoded.run_as_admin());
        assert!(decoded.arguments.is_none());
        Ok(())
    }

    #[test]
    fn non_latin_targets_survive_via_unicode_offsets() -> anyhow::Result<()> {
        let link = ShellLink::for_target("/home/ユーザー/文書.txt");
        let decoded = decode(&encode(&link))?;
        assert_eq!(decoded.target_path().as_deref(), Some("/home/ユーザー/文書.txt"));
        Ok(())
    }

    #[test]
    fn foreign_header_is_rejected() {
        let err = decode(b"not a shell link at all, just some text bytes").expect_err("bad header");
        assert!(matches!(err, ShortcutError::InvalidHeader { field: "header_size", .. }));
    }

    #[test]
    fn truncated_data_is_reported() {
        let bytes = encode(&sample());
        let err = decode(&bytes[..90]).expect_err("truncated");
        assert!(matches!(err, ShortcutError::Truncated { .. }));
    }

    #[test]
    fn environment_block_supplies_missing_target() -> anyhow::Result<()> {
        let mut bytes = encode(&ShellLink {
            show_command: SW_SHOWNORMAL,
            ..ShellLink::default()
        });
        bytes.truncate(bytes.len() - 4);
        let mut block = Vec::new();
        put_u32(&mut block, 0x314);
        put_u32(&mut block, ENVIRONMENT_BLOCK_SIGNATURE);
        let mut ansi = b"%WINDIR%\\notepad.exe".to_vec();
        ansi.resize(ENVIRONMENT_ANSI_LEN, 0);
        block.extend_from_slice(&ansi);
        block.resize(block.len() + ENVIRONMENT_UNICODE_LEN, 0);
        bytes.extend_from_slice(&block);
        put_u32(&mut bytes, 0);

        let decoded = decode(&bytes)?;
        assert!(decoded.link_info.is_none());
        assert_eq!(decoded.target_path().as_deref(), Some("%WINDIR%\\notepad.exe"));
        Ok(())
    }

    #[test]
    fn network_share_joins_suffix() {
        let info = LinkInfo {
            local_base_path: None,
            network_share: Some(r"\\server\share".to_string()),
            common_path_suffix: Some(r"docs\a.txt".to_string()),
        };
        assert_eq!(info.target_path().as_deref(), Some(r"\\server\share\docs\a.txt"));
    }

    #[test]
    fn filetime_conversion_round_trips() {
        let time = Utc.with_ymd_and_hms(2001, 9, 9, 1, 46, 40).single();
        assert_eq!(from_filetime(to_filetime(time)), time);
        assert_eq!(to_filetime(None), 0);
        assert!(from_filetime(0).is_none());
    }

    #[test]
    fn out_of_range_times_encode_as_zero() {
        assert_eq!(to_filetime(Some(DateTime::<Utc>::MAX_UTC)), 0);
        assert_eq!(to_filetime(Utc.with_ymd_and_hms(1500, 1, 1, 0, 0, 0).single()), 0);
    }
}
