//! CI plan selection: diff, inventory, plan request, validated output.

use crate::changes::DiffCollector;
use crate::inventory::{discover_tests, DEFAULT_TEST_SUFFIX};
use crate::output::{fail_open_directives, plan_directives, Directive, OutputSink};
use crate::plan::PlanRequester;
use cipilot_core::obs::{emit_plan_fail_open, emit_plan_requested, emit_plan_written};
use cipilot_core::{run_span, CipilotError, CompletionService, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Settings for one plan-selection run.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub collector: DiffCollector,

    /// Suffix identifying test files for the inventory.
    pub test_suffix: String,

    pub sink: OutputSink,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            collector: DiffCollector::default(),
            test_suffix: DEFAULT_TEST_SUFFIX.to_string(),
            sink: OutputSink::from_env(),
        }
    }
}

/// How a plan-selection run ended. Every variant exits 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Nothing changed (or the diff could not be read); no output written.
    NoChanges,

    /// The model's plan was validated and written.
    Planned { directives: Vec<Directive> },

    /// Planning failed; the maximal plan was written instead.
    FailOpen {
        error: String,
        directives: Vec<Directive>,
    },
}

impl PlanOutcome {
    pub fn directives(&self) -> &[Directive] {
        match self {
            PlanOutcome::NoChanges => &[],
            PlanOutcome::Planned { directives } | PlanOutcome::FailOpen { directives, .. } => {
                directives.as_slice()
            }
        }
    }
}

/// Plan-selection orchestrator.
pub struct PlanPipeline;

impl PlanPipeline {
    /// Run plan selection once in `workspace`.
    ///
    /// `connect` is called only when there are changes to evaluate. A
    /// connection, request or parse failure selects the fail-open plan;
    /// only failing to write the sink is an error.
    pub async fn run<F>(
        settings: &PlanSettings,
        workspace: &Path,
        connect: F,
    ) -> Result<PlanOutcome>
    where
        F: FnOnce() -> Result<Arc<dyn CompletionService>>,
    {
        let run_id = Uuid::new_v4().to_string();
        Self::select(settings, workspace, connect)
            .instrument(run_span("ci-plan", &run_id))
            .await
    }

    async fn select<F>(
        settings: &PlanSettings,
        workspace: &Path,
        connect: F,
    ) -> Result<PlanOutcome>
    where
        F: FnOnce() -> Result<Arc<dyn CompletionService>>,
    {
        let changes = settings.collector.collect(workspace);
        if changes.is_empty() {
            println!("No changes.");
            return Ok(PlanOutcome::NoChanges);
        }

        let tests = discover_tests(workspace, &settings.test_suffix);
        emit_plan_requested(
            changes.changed_files.len(),
            changes.diff_text.chars().count(),
            tests.len(),
        );

        let decided: Result<Vec<Directive>> = async {
            let service = connect()?;
            let plan = PlanRequester::request(service.as_ref(), &changes, &tests).await?;
            Ok::<_, CipilotError>(plan_directives(&plan, workspace))
        }
        .await;

        let outcome = match decided {
            Ok(directives) => PlanOutcome::Planned { directives },
            Err(e) => {
                println!("AI Error: {e}");
                emit_plan_fail_open(&e);
                PlanOutcome::FailOpen {
                    error: e.to_string(),
                    directives: fail_open_directives(),
                }
            }
        };

        for directive in outcome.directives() {
            println!("{directive}");
        }
        settings.sink.append(outcome.directives())?;
        emit_plan_written(
            &settings.sink.path().display().to_string(),
            outcome.directives().len(),
        );

        Ok(outcome)
    }
}
