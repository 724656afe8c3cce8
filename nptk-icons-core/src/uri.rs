// SPDX-License-Identifier: LGPL-3.0-only
//! Conversion between local paths and `file://` URIs.

use std::path::{Path, PathBuf};

/// Convert a file path to a `file://` URI.
///
/// Relative paths are resolved against the current directory. Each path
/// segment is percent-encoded; separators are kept.
pub fn path_to_uri(path: &Path) -> String {
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };

    let path_str = absolute_path.to_string_lossy();
    let encoded: Vec<String> = path_str
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("file://{}", encoded.join("/"))
}

/// Convert a `file://` URI back to a path.
///
/// Returns `None` for other schemes or undecodable input.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let path_part = uri.strip_prefix("file://")?;
    // `file://localhost/path` names the local host explicitly.
    let path_part = path_part.strip_prefix("localhost").unwrap_or(path_part);
    if !path_part.starts_with('/') {
        return None;
    }
    let decoded = urlencoding::decode(path_part).ok()?;
    Some(PathBuf::from(decoded.as_ref()))
}

/// The scheme of a URI, if it has the `scheme://` form.
pub fn uri_scheme(uri: &str) -> Option<&str> {
    let (scheme, _) = uri.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}
