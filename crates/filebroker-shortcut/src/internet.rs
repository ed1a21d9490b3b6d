//! Internet shortcut (`.url`) files.

use std::path::Path;

use url::Url;

const SECTION: &str = "[InternetShortcut]";
const URL_KEY: &str = "URL";

/// Read the `URL` key of the `[InternetShortcut]` section.
#[must_use]
pub fn parse(text: &str) -> Option<String> {
    let mut in_section = false;
    for line in text.lines().map(str::trim) {
        if line.starts_with('[') {
            in_section = line.eq_ignore_ascii_case(SECTION);
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=')
            && key.trim().eq_ignore_ascii_case(URL_KEY)
        {
            let value = value.trim();
            return (!value.is_empty()).then(|| value.to_string());
        }
    }
    None
}

/// Render an internet shortcut for `url`.
#[must_use]
pub fn render(url: &str) -> String {
    format!("{SECTION}\r\n{URL_KEY}={url}\r\n")
}

/// Add a scheme to `raw` when it lacks one.
///
/// `www.` gets `http://`, `ftp.` gets `ftp://`, absolute local paths become
/// `file:///` URLs and anything else without a scheme gets `http://`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let raw = raw.trim();
    if starts_with_ignore_case(raw, "www.") {
        return format!("http://{raw}");
    }
    if starts_with_ignore_case(raw, "ftp.") {
        return format!("ftp://{raw}");
    }
    if is_drive_path(raw) {
        return format!("file:///{}", raw.replace('\\', "/"));
    }
    if Path::new(raw).is_absolute() {
        if let Ok(url) = Url::from_file_path(raw) {
            return url.into();
        }
        return format!("file://{raw}");
    }
    match Url::parse(raw) {
        Ok(url) if url.scheme().len() > 1 => raw.to_string(),
        _ => format!("http://{raw}"),
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn is_drive_path(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
}
