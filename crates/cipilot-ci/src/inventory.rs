//! Test inventory: candidate test files in the working tree.

use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Default suffix identifying test files.
pub const DEFAULT_TEST_SUFFIX: &str = ".spec.ts";

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}

/// List files under `root` whose names end with `suffix`.
///
/// Paths are relative to `root`, `/`-separated and sorted. Hidden
/// directories and `node_modules` are not descended into.
pub fn discover_tests(root: &Path, suffix: &str) -> Vec<String> {
    let mut tests: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .filter_map(|e| {
            e.path().strip_prefix(root).ok().map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
        })
        .collect();
    tests.sort();
    tests
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn finds_nested_specs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/app/z.component.spec.ts");
        touch(dir.path(), "src/app/a.service.spec.ts");
        touch(dir.path(), "src/app/a.service.ts");
        touch(dir.path(), "e2e/login.spec.ts");

        assert_eq!(
            discover_tests(dir.path(), DEFAULT_TEST_SUFFIX),
            vec![
                "e2e/login.spec.ts",
                "src/app/a.service.spec.ts",
                "src/app/z.component.spec.ts",
            ]
        );
    }

    #[test]
    fn skips_hidden_and_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".angular/cache/x.spec.ts");
        touch(dir.path(), "node_modules/lib/y.spec.ts");
        touch(dir.path(), "src/keep.spec.ts");

        assert_eq!(
            discover_tests(dir.path(), DEFAULT_TEST_SUFFIX),
            vec!["src/keep.spec.ts"]
        );
    }

    #[test]
    fn empty_tree_has_no_tests() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_tests(dir.path(), DEFAULT_TEST_SUFFIX).is_empty());
    }
}
