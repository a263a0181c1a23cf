//! Structured observability hooks for pipeline lifecycle events.
//!
//! Events are emitted at `info!` level (`warn!` for fail-open and failed
//! verification). Filter with `RUST_LOG`; pass `--json` to the binaries for
//! JSON lines.

use tracing::{info, warn, Span};

/// Run-scoped span for one pipeline run.
///
/// Attach it to the run's future with `tracing::Instrument` so every event
/// carries the pipeline name and run id across await points.
///
/// # Example
///
/// ```ignore
/// run_pipeline().instrument(run_span("ai-fix", &run_id)).await
/// ```
pub fn run_span(pipeline: &str, run_id: &str) -> Span {
    tracing::info_span!("cipilot.run", pipeline = %pipeline, run_id = %run_id)
}

/// Emit event: fix loop started with the given test command.
pub fn emit_fix_started(command: &str) {
    info!(event = "fix.started", command = %command);
}

/// Emit event: a failing file was located in the test output.
pub fn emit_fix_located(matched: &str, target: &str) {
    info!(event = "fix.located", matched = %matched, target = %target);
}

/// Emit event: a model-proposed patch overwrote `target`.
pub fn emit_patch_applied(target: &str, before_digest: &str, after_digest: &str) {
    info!(
        event = "fix.applied",
        target = %target,
        before = %before_digest,
        after = %after_digest,
    );
}

/// Emit event: fix loop finished with an outcome label and exit code.
pub fn emit_fix_finished(outcome: &str, exit_code: i32, duration_ms: u64) {
    if exit_code == 0 {
        info!(event = "fix.finished", outcome = %outcome, exit_code, duration_ms);
    } else {
        warn!(event = "fix.finished", outcome = %outcome, exit_code, duration_ms);
    }
}

/// Emit event: fix loop aborted with an error before reaching an outcome.
pub fn emit_fix_errored(error: &dyn std::fmt::Display, duration_ms: u64) {
    warn!(
        event = "fix.finished",
        outcome = "error",
        error = %error,
        duration_ms,
    );
}

/// Emit event: changes collected and a plan is about to be requested.
pub fn emit_plan_requested(changed_files: usize, diff_chars: usize, tests: usize) {
    info!(
        event = "plan.requested",
        changed_files,
        diff_chars,
        tests,
    );
}

/// Emit event: directives appended to the output sink.
pub fn emit_plan_written(sink: &str, directives: usize) {
    info!(event = "plan.written", sink = %sink, directives);
}

/// Emit event: planning failed and the fail-open plan was substituted.
pub fn emit_plan_fail_open(error: &dyn std::fmt::Display) {
    warn!(event = "plan.fail_open", error = %error);
}
