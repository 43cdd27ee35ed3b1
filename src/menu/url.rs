/// Reduces a link to its comparable path: scheme, host, query and fragment
/// are dropped, relative paths are anchored at the site root and trailing
/// slashes removed. The site root normalizes to `/`.
pub fn normalize_url(url: &str) -> String {
    let without_suffix = url.trim().split(['?', '#']).next().unwrap_or_default();

    let path = match without_suffix.find("://") {
        Some(scheme_end) => strip_authority(&without_suffix[scheme_end + 3..]),
        None => match without_suffix.strip_prefix("//") {
            Some(rest) => strip_authority(rest),
            None => without_suffix,
        },
    };

    let path = path.trim_end_matches('/');
    if path.is_empty() {
        String::from("/")
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn strip_authority(rest: &str) -> &str {
    rest.find('/').map_or("", |slash| &rest[slash..])
}

/// Final non-empty path segment, used for slug comparisons.
pub fn last_path_segment(url: &str) -> Option<String> {
    normalize_url(url)
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}
