//! Pipeline output: `key=value` directives appended to a sink file.

use crate::plan::{CiPlan, Selection};
use crate::stage::BuiltinStage;
use crate::validate::validate_paths;
use cipilot_core::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming the output sink.
pub const ENV_OUTPUT: &str = "GITHUB_OUTPUT";

/// Sink used when [`ENV_OUTPUT`] is unset.
pub const DEFAULT_OUTPUT: &str = "output.txt";

pub const KEY_RUN_SNYK: &str = "run_snyk";
pub const KEY_LINT_COMMAND: &str = "lint_command";
pub const KEY_TEST_COMMAND: &str = "test_command";
pub const KEY_RUN_SONAR: &str = "run_sonar";
pub const KEY_SONAR_INCLUSIONS: &str = "sonar_inclusions";

/// Inclusion pattern used by the fail-open plan.
pub const SONAR_EVERYTHING: &str = "**/*";

/// One `key=value` line for the consuming pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub key: &'static str,
    pub value: String,
}

impl Directive {
    fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    fn flag(key: &'static str, value: bool) -> Self {
        Self::new(key, if value { "true" } else { "false" })
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

fn stage_command(stage: BuiltinStage, selection: &Selection, root: &Path) -> String {
    match selection {
        Selection::All => {
            info!(stage = stage.name(), "Stage selected for the whole project");
            stage.full_command().to_string()
        }
        Selection::Paths(paths) => {
            let valid = validate_paths(root, paths);
            if valid.is_empty() {
                stage.noop_command().to_string()
            } else {
                info!(
                    stage = stage.name(),
                    files = valid.len(),
                    "Stage selected for specific files"
                );
                stage.targeted_command(&valid)
            }
        }
    }
}

/// Translate `plan` into directives, validating every path against `root`.
///
/// Always yields `run_snyk`, `lint_command`, `test_command` and `run_sonar`;
/// `sonar_inclusions` follows only when `run_sonar=true`.
pub fn plan_directives(plan: &CiPlan, root: &Path) -> Vec<Directive> {
    let mut directives = vec![
        Directive::flag(KEY_RUN_SNYK, plan.run_security_scan),
        Directive::new(
            KEY_LINT_COMMAND,
            stage_command(BuiltinStage::Lint, &plan.lint_files, root),
        ),
        Directive::new(
            KEY_TEST_COMMAND,
            stage_command(BuiltinStage::Test, &plan.tests_to_run, root),
        ),
    ];

    let sonar = validate_paths(root, &plan.sonar_inclusions);
    if sonar.is_empty() {
        directives.push(Directive::flag(KEY_RUN_SONAR, false));
    } else {
        info!(files = sonar.len(), "Static analysis scoped to changed files");
        directives.push(Directive::flag(KEY_RUN_SONAR, true));
        directives.push(Directive::new(KEY_SONAR_INCLUSIONS, sonar.join(",")));
    }

    directives
}

/// The maximal plan: scan, analyze, test and lint everything.
pub fn fail_open_directives() -> Vec<Directive> {
    vec![
        Directive::flag(KEY_RUN_SNYK, true),
        Directive::flag(KEY_RUN_SONAR, true),
        Directive::new(KEY_SONAR_INCLUSIONS, SONAR_EVERYTHING),
        Directive::new(KEY_TEST_COMMAND, BuiltinStage::Test.full_command()),
        Directive::new(KEY_LINT_COMMAND, BuiltinStage::Lint.full_command()),
    ]
}

/// Append-only file the consuming pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSink {
    path: PathBuf,
}

impl OutputSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink named by `GITHUB_OUTPUT`, else `output.txt`.
    pub fn from_env() -> Self {
        Self::from_setting(std::env::var(ENV_OUTPUT).ok())
    }

    /// Sink for a configured path. Unset or blank means `output.txt`.
    pub fn from_setting(value: Option<String>) -> Self {
        Self::new(
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `directives`, one line each.
    pub fn append(&self, directives: &[Directive]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut buf = String::new();
        for directive in directives {
            buf.push_str(&directive.to_string());
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())?;
        Ok(())
    }
}
