//! Filename extraction and sanitization for stored downloads.
//!
//! Names come from, in order: the `Content-Disposition` header, the last
//! path segment of the request URI, or [`FALLBACK_FILENAME`]. No extension is
//! ever guessed from the content type or payload.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

use super::constants::FALLBACK_FILENAME;
use super::envelope::ResponseHeaders;

/// Resolves the name under which a response body is stored.
///
/// Always returns a non-empty name.
#[must_use]
pub fn resolve_filename(headers: &ResponseHeaders, url: &Url) -> String {
    let disposition_name = headers
        .get("content-disposition")
        .into_iter()
        .flatten()
        .find_map(|value| parse_content_disposition(value))
        .map(|name| sanitize_filename(&name))
        .filter(|name| is_meaningful(name));
    if let Some(name) = disposition_name {
        return name;
    }

    if let Some(name) = filename_from_url(url) {
        return name;
    }

    FALLBACK_FILENAME.to_string()
}

/// Parses a Content-Disposition header value to extract the filename.
///
/// Handles:
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename=example.pdf`
/// - `attachment; filename*=UTF-8''example%20file.pdf` (RFC 5987, preferred)
///
/// Parameter names match case-insensitively.
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets valid for slicing `header`.
    let lower = header.to_ascii_lowercase();

    if let Some(start) = find_param(&lower, "filename*=") {
        let value = header[start..].trim_start();
        let end = value.find(';').unwrap_or(value.len());
        let value = value[..end].trim().trim_matches('"');
        // charset'language'encoded_value
        let decoded = value
            .splitn(3, '\'')
            .nth(2)
            .and_then(|encoded| urlencoding::decode(encoded).ok())
            .filter(|decoded| !decoded.is_empty());
        if let Some(decoded) = decoded {
            return Some(decoded.into_owned());
        }
    }

    let start = find_param(&lower, "filename=")?;
    let value = header[start..].trim_start();

    if let Some(quoted) = value.strip_prefix('"') {
        let filename = unquote(quoted)?;
        return (!filename.is_empty()).then_some(filename);
    }

    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Byte offset just past `name` where it appears as a parameter (at the
/// start or after `;` / whitespace).
fn find_param(lower: &str, name: &str) -> Option<usize> {
    lower.match_indices(name).find_map(|(pos, _)| {
        let at_boundary = lower[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| c == ';' || c.is_whitespace());
        at_boundary.then_some(pos + name.len())
    })
}

/// Reads a quoted-string body (opening quote already consumed), honoring
/// backslash escapes. Returns `None` when the closing quote is missing.
fn unquote(input: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(out),
            '\\' => out.push(chars.next()?),
            c => out.push(c),
        }
    }
    None
}

/// Last non-empty path segment of `url`, percent-decoded and sanitized.
pub(crate) fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.rev().find(|segment| !segment.is_empty())?;
    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(
            segment = %last,
            error = %e,
            "URL decoding failed, using raw segment"
        );
        last.into()
    });
    let name = sanitize_filename(&decoded);
    is_meaningful(&name).then_some(name)
}

/// Sanitizes a filename for storage safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// A sanitized name made only of replacement characters carries nothing
/// worth keeping.
pub(crate) fn is_meaningful(name: &str) -> bool {
    !name.trim_matches('_').is_empty()
}
