//! Path handling: parent/leaf splitting for resource creation and `{param}`
//! extraction for request parameters.

use indexmap::IndexMap;
use regex::Regex;

/// A route path split into the parent path and the final segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitPath {
    pub parent_path: String,
    pub path_part: String,
}

/// Split a route path into `(parent, leaf)`.
/// e.g. "mike/tom/tim" -> parent "mike/tom", part "tim"; "" and "/" both
/// denote the root (empty parent, empty part). A trailing slash is ignored.
pub fn split_path(path: &str) -> SplitPath {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return SplitPath {
            parent_path: String::new(),
            path_part: String::new(),
        };
    }
    match trimmed.rsplit_once('/') {
        Some((parent, part)) => SplitPath {
            parent_path: parent.to_string(),
            path_part: part.to_string(),
        },
        None => SplitPath {
            parent_path: String::new(),
            path_part: trimmed.to_string(),
        },
    }
}

/// Extract `{name}` / `{name+}` segments as `method.request.path.name` keys.
/// Static paths yield an empty map.
pub fn path_request_parameters(path: &str) -> IndexMap<String, bool> {
    let pattern = Regex::new(r"\{([^{}+]+)\+?\}").expect("static pattern");
    pattern
        .captures_iter(path)
        .map(|capture| (format!("method.request.path.{}", &capture[1]), true))
        .collect()
}
