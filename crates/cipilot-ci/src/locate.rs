//! Failure localization from test-runner output.

use cipilot_core::exists_in;
use regex::Regex;
use std::path::Path;

/// A source file implicated by failing test output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureLocation {
    /// Path as it appeared in the output.
    pub matched: String,

    /// Path the fix loop should read and overwrite.
    pub file_path: String,
}

/// Scans test output for the first source path under a known root.
#[derive(Debug, Clone)]
pub struct FailureLocator {
    source_root: String,
    extension: String,
    test_suffix: String,
    pattern: Regex,
}

impl Default for FailureLocator {
    fn default() -> Self {
        Self::new("src/", ".ts", ".spec.ts")
    }
}

impl FailureLocator {
    /// Build a locator for paths like `<source_root>…<extension>`, where
    /// files ending in `test_suffix` are tests.
    pub fn new(source_root: &str, extension: &str, test_suffix: &str) -> Self {
        let pattern = Regex::new(&format!(
            r"({}[A-Za-z0-9_\-./]+{})\b",
            regex::escape(source_root),
            regex::escape(extension)
        ))
        .expect("escaped locator pattern compiles");

        Self {
            source_root: source_root.to_string(),
            extension: extension.to_string(),
            test_suffix: test_suffix.to_string(),
            pattern,
        }
    }

    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    /// Locate the file to fix, resolving existence against `root`.
    ///
    /// A test file is swapped for its implementation only when that
    /// implementation exists; otherwise the test path itself is returned.
    pub fn locate(&self, output: &str, root: &Path) -> Option<FailureLocation> {
        let matched = self.pattern.captures(output)?.get(1)?.as_str().to_string();

        let file_path = self
            .implementation_for(&matched)
            .filter(|candidate| exists_in(root, candidate))
            .unwrap_or_else(|| matched.clone());

        Some(FailureLocation { matched, file_path })
    }

    /// Implementation path for a test file, `None` for non-test paths.
    pub fn implementation_for(&self, path: &str) -> Option<String> {
        path.strip_suffix(&self.test_suffix)
            .map(|stem| format!("{stem}{}", self.extension))
    }
}
