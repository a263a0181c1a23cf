//! Path validation against the working tree.

use cipilot_core::exists_in;
use std::path::Path;

/// Keep only the paths that exist relative to `root`, in input order.
///
/// Guards downstream tools against paths the model invented. Absolute paths
/// and paths climbing out through `..` are dropped even when they exist.
pub fn validate_paths(root: &Path, paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .filter(|p| exists_in(root, p))
        .cloned()
        .collect()
}
