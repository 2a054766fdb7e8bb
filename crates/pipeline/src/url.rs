//! Virtual-path normalization — strips scheme and host from absolute URLs.

/// Strip scheme and host: everything from the first `/` after the first
/// `://`. An absolute URL with no path after the host degrades to the bare
/// remainder after `://`; input without `://` comes back unchanged. Never
/// fails — malformed input falls back, it does not error.
pub fn virtual_path(url: &str) -> String {
    match url.split_once("://") {
        None => url.to_string(),
        Some((_, rest)) => match rest.find('/') {
            Some(idx) => rest[idx..].to_string(),
            None => rest.to_string(),
        },
    }
}
