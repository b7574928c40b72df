//! Shared helpers: text decoding and archive path handling.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the encoding named in the XML declaration
/// 3. Falls back to Windows-1252 (common in old ebooks)
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(name) = extract_xml_encoding(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the encoding name from an XML declaration, if present.
///
/// Parses `<?xml ... encoding="..." ?>` in the first ~100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    if after_enc.is_empty() {
        return None;
    }

    let quote = after_enc[0];
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_start = 1;
    let value_end = after_enc[value_start..].iter().position(|&b| b == quote)? + value_start;

    std::str::from_utf8(&after_enc[value_start..value_end]).ok()
}

/// Strip UTF-8 BOM (byte order mark) if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Normalize an archive path: forward slashes only, `.` and `..` segments
/// collapsed. Lookup keys produced here are platform-independent.
///
/// `..` at the root is dropped rather than preserved; archive paths never
/// escape the archive.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Resolve an href relative to the directory of `from_path` (an archive
/// path), returning a normalized lookup key.
///
/// A fragment suffix (`#id`) is dropped before resolution.
pub fn resolve_href(from_path: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href).trim();
    let dir = match from_path.rfind('/') {
        Some(pos) => &from_path[..pos],
        None => "",
    };
    if dir.is_empty() {
        normalize_path(href)
    } else {
        normalize_path(&format!("{}/{}", dir, href))
    }
}

/// Join a base directory and an href into a normalized archive path.
pub fn join_path(base: &str, href: &str) -> String {
    if base.is_empty() {
        normalize_path(href)
    } else {
        normalize_path(&format!("{}/{}", base, href))
    }
}
