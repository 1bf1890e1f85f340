//! Helper utilities for key paths used in loader error messages.

/// Join a parent key path and a child key.
pub(super) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Path of one element of a sequence.
pub(super) fn index_path(prefix: &str, idx: usize) -> String {
    format!("{prefix}[{idx}]")
}
