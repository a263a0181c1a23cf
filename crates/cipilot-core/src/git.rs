//! Git invocation helpers.

use std::path::Path;
use std::process::Command;

use crate::error::{CipilotError, Result};

/// Run `git <args>` in `repo_dir` and return its stdout.
///
/// A missing `git` binary or a non-zero exit are both reported as
/// [`CipilotError::GitError`] with git's stderr attached.
pub fn git_output(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| CipilotError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CipilotError::GitError(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
