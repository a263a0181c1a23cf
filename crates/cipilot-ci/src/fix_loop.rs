//! Fix-and-verify loop: run tests, localize, patch, apply, re-run.

use crate::locate::FailureLocator;
use crate::patch::{PatchRequest, PatchRequester};
use crate::runner::TestRunner;
use crate::stage::StageConfig;
use cipilot_core::obs::{
    emit_fix_errored, emit_fix_finished, emit_fix_located, emit_fix_started, emit_patch_applied,
};
use cipilot_core::{content_digest, run_span, write_atomic, CompletionService, Result};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

/// Name of the marker file written after a verified fix.
pub const SUCCESS_MARKER: &str = "AI_FIX_SUCCESS";

/// Settings for one fix-loop run.
#[derive(Debug, Clone)]
pub struct FixSettings {
    /// Test command, run before and after the patch.
    pub test_stage: StageConfig,

    pub locator: FailureLocator,

    pub patcher: PatchRequester,

    /// Marker written (relative to the workspace) on a verified fix.
    pub marker_file: String,
}

impl Default for FixSettings {
    fn default() -> Self {
        Self {
            test_stage: StageConfig::unit_tests(),
            locator: FailureLocator::default(),
            patcher: PatchRequester::default(),
            marker_file: SUCCESS_MARKER.to_string(),
        }
    }
}

/// How a fix-loop run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Tests passed on the first run; nothing was touched.
    AlreadyPassing,

    /// No source path could be found in the failing output.
    Unlocalized,

    /// A path was found but the file is not on disk.
    TargetMissing { file_path: String },

    /// The patch was applied and the re-run passed.
    Verified { file_path: String },

    /// The patch was applied but tests still fail. The patched file stays.
    Failed { file_path: String },
}

impl FixOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            FixOutcome::Failed { .. } => 1,
            _ => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FixOutcome::AlreadyPassing => "already_passing",
            FixOutcome::Unlocalized => "unlocalized",
            FixOutcome::TargetMissing { .. } => "target_missing",
            FixOutcome::Verified { .. } => "verified",
            FixOutcome::Failed { .. } => "failed",
        }
    }
}

/// Fix-loop orchestrator.
pub struct FixLoop;

impl FixLoop {
    /// Run the loop once in `workspace`.
    ///
    /// `connect` is called only after a failure has been localized, so a run
    /// whose tests already pass never needs completion-service credentials.
    pub async fn run<F>(settings: &FixSettings, workspace: &Path, connect: F) -> Result<FixOutcome>
    where
        F: FnOnce() -> Result<Arc<dyn CompletionService>>,
    {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        async {
            let result = Self::attempt(settings, workspace, connect).await;
            let duration_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(outcome) => {
                    emit_fix_finished(outcome.label(), outcome.exit_code(), duration_ms)
                }
                Err(e) => emit_fix_errored(e, duration_ms),
            }
            result
        }
        .instrument(run_span("ai-fix", &run_id))
        .await
    }

    async fn attempt<F>(settings: &FixSettings, workspace: &Path, connect: F) -> Result<FixOutcome>
    where
        F: FnOnce() -> Result<Arc<dyn CompletionService>>,
    {
        emit_fix_started(&settings.test_stage.display_command());
        println!("Running unit tests...");

        let first = TestRunner::run(&settings.test_stage, workspace).await?;
        debug!(
            exit_code = first.exit_code,
            duration_ms = first.duration_ms,
            "Initial test run finished"
        );
        if first.passed {
            println!("Tests passed initially. No AI fix needed.");
            return Ok(FixOutcome::AlreadyPassing);
        }

        println!("Tests Failed. Identifying failing file...");
        let Some(location) = settings.locator.locate(&first.combined_output, workspace) else {
            println!("Could not parse file path from error log.");
            return Ok(FixOutcome::Unlocalized);
        };
        emit_fix_located(&location.matched, &location.file_path);
        println!("Targeting file: {}", location.file_path);

        let target = workspace.join(&location.file_path);
        let original_source = match std::fs::read_to_string(&target) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                println!("File not found.");
                return Ok(FixOutcome::TargetMissing {
                    file_path: location.file_path,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let service = connect()?;
        println!("Requesting fix for {}...", location.file_path);
        let request = PatchRequest {
            file_path: location.file_path.clone(),
            original_source,
            error_log: first.combined_output,
        };
        let response = settings.patcher.request(service.as_ref(), &request).await?;

        write_atomic(&target, &response.sanitized_source)?;
        emit_patch_applied(
            &location.file_path,
            &content_digest(request.original_source.as_bytes()),
            &content_digest(response.sanitized_source.as_bytes()),
        );

        println!("Verifying fix...");
        let retry = TestRunner::run(&settings.test_stage, workspace).await?;
        debug!(
            exit_code = retry.exit_code,
            duration_ms = retry.duration_ms,
            "Verification run finished"
        );
        if retry.passed {
            println!("AI Fix Verified! Tests Passed.");
            std::fs::write(workspace.join(&settings.marker_file), "true")?;
            info!(marker = %settings.marker_file, "Wrote success marker");
            Ok(FixOutcome::Verified {
                file_path: location.file_path,
            })
        } else {
            println!("AI Fix Failed. Tests still failing.");
            Ok(FixOutcome::Failed {
                file_path: location.file_path,
            })
        }
    }
}
