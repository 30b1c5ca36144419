//! Helpers for the `/`-separated entry names stored in an archive.
//!
//! Entry names are never interpreted through the host filesystem, so these
//! work on plain strings regardless of platform.

/// Split an entry name into `(parent, basename)`
///
/// Trailing slashes on the parent are dropped unless the parent consists only
/// of slashes. The parent of a top-level entry is the empty string.
pub fn split_entry(name: &str) -> (&str, &str) {
    let cut = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (head, tail) = name.split_at(cut);
    if head.is_empty() || head.bytes().all(|b| b == b'/') {
        (head, tail)
    } else {
        (head.trim_end_matches('/'), tail)
    }
}

/// Parent part of an entry name
pub fn parent_of(name: &str) -> &str {
    split_entry(name).0
}

/// Extension of the basename including the leading dot, or `""`
///
/// Leading dots of the basename do not start an extension (`.xml` has none).
pub fn extension_of(name: &str) -> &str {
    let base_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let base = &name[base_start..];
    match base.rfind('.') {
        Some(dot) if base[..dot].bytes().any(|b| b != b'.') => &base[dot..],
        _ => "",
    }
}

/// Join a subdirectory and a file name with `/`
pub fn join_entry(subdir: Option<&str>, filename: &str) -> String {
    match subdir {
        Some(dir) => format!("{}/{}", dir, filename),
        None => filename.to_string(),
    }
}
