//! Dotted-path addressing into JSON documents (`"scheduler.useCache"`).

use serde_json::Value;

fn segments(path: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

/// Resolve `path` inside `root`. Only object fields are addressable.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path)?
        .into_iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Replace the value at an existing `path`. Returns `false`, leaving `root`
/// untouched, if the path does not already exist.
pub fn set_path(root: &mut Value, path: &str, value: Value) -> bool {
    let Some(parts) = segments(path) else {
        return false;
    };
    let mut node = root;
    for segment in parts {
        match node.as_object_mut().and_then(|obj| obj.get_mut(segment)) {
            Some(child) => node = child,
            None => return false,
        }
    }
    *node = value;
    true
}
