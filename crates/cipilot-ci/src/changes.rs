//! Change collection: changed files and unified diff against a base ref.

use cipilot_core::{git_output, is_git_repo, CipilotError, Result};
use std::path::Path;
use tracing::warn;

/// Default comparison base (three-dot: changes since the merge base).
pub const DEFAULT_BASE_REF: &str = "origin/main...HEAD";

/// Default diff budget in characters.
pub const DEFAULT_DIFF_BUDGET: usize = 15_000;

/// Marker appended to a truncated diff.
pub const TRUNCATION_MARKER: &str = "\n...[TRUNCATED]";

/// Files and diff text for one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changed_files: Vec<String>,
    pub diff_text: String,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed_files.is_empty()
    }
}

/// Collects a [`ChangeSet`] from git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffCollector {
    pub base_ref: String,
    pub budget_chars: usize,
}

impl Default for DiffCollector {
    fn default() -> Self {
        Self {
            base_ref: DEFAULT_BASE_REF.to_string(),
            budget_chars: DEFAULT_DIFF_BUDGET,
        }
    }
}

impl DiffCollector {
    /// Collect changes in `repo_dir`.
    ///
    /// Any git failure yields an empty change set, which callers treat as
    /// "nothing changed".
    pub fn collect(&self, repo_dir: &Path) -> ChangeSet {
        match self.try_collect(repo_dir) {
            Ok(changes) => changes,
            Err(e) => {
                println!("Error fetching git diff: {e}");
                warn!(base = %self.base_ref, error = %e, "Diff retrieval failed");
                ChangeSet::default()
            }
        }
    }

    fn try_collect(&self, repo_dir: &Path) -> Result<ChangeSet> {
        if !is_git_repo(repo_dir) {
            return Err(CipilotError::GitError(format!(
                "{} is not inside a git work tree",
                repo_dir.display()
            )));
        }

        let names = git_output(repo_dir, &["diff", "--name-only", &self.base_ref])?;
        let diff = git_output(repo_dir, &["diff", &self.base_ref])?;

        Ok(ChangeSet {
            changed_files: names
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            diff_text: truncate_diff(diff, self.budget_chars),
        })
    }
}

/// Cut `diff` to `budget` characters and append the truncation marker.
pub fn truncate_diff(diff: String, budget: usize) -> String {
    match diff.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}{}", &diff[..cut], TRUNCATION_MARKER),
        None => diff,
    }
}
