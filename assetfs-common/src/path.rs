//! Path helpers shared by adapters whose remote has flat identifiers.
//!
//! The remote store has no directories: a "path" is a public identifier
//! that may contain `/`. These helpers compute effective identifiers and
//! derive directory-like views from them.

use std::collections::BTreeSet;

/// Compute the effective remote identifier for `path` under `prefix`.
///
/// The prefix is trimmed of `/` on both sides and the path of leading `/`.
/// A path that is already relative to the prefix is returned unchanged, so
/// applying the function twice gives the same identifier.
pub fn prefix_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    if path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/')) {
        return path.to_string();
    }
    format!("{}/{}", prefix, path)
}

/// Split an identifier into its directory part and its filename with the
/// last extension removed. The directory is `None` at the root.
pub fn split_identifier(id: &str) -> (Option<&str>, &str) {
    let (dir, base) = match id.rfind('/') {
        Some(i) => (Some(&id[..i]).filter(|d| !d.is_empty()), &id[i + 1..]),
        None => (None, id),
    };
    let stem = match base.rfind('.') {
        // A leading dot names a hidden file, not an extension
        Some(i) if i > 0 => &base[..i],
        _ => base,
    };
    (dir, stem)
}

/// The identifier with its extension stripped, keeping the directory part.
pub fn remote_identifier(id: &str) -> String {
    match split_identifier(id) {
        (Some(dir), stem) => format!("{}/{}", dir, stem),
        (None, stem) => stem.to_string(),
    }
}

/// Filename component of an identifier, extension removed.
pub fn file_stem(id: &str) -> &str {
    split_identifier(id).1
}

/// Derive the immediate sub-directories of `directory` from a set of
/// identifiers. Returned prefixes carry no trailing slash.
pub fn directory_prefixes<'a, I>(ids: I, directory: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let directory = directory.trim_matches('/');
    let base = if directory.is_empty() {
        String::new()
    } else {
        format!("{}/", directory)
    };

    let mut dirs = BTreeSet::new();
    for id in ids {
        let Some(rest) = id.strip_prefix(base.as_str()) else {
            continue;
        };
        if let Some(pos) = rest.find('/') {
            if pos > 0 {
                dirs.insert(format!("{}{}", base, &rest[..pos]));
            }
        }
    }
    dirs.into_iter().collect()
}
