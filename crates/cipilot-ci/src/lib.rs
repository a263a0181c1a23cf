//! CIPILOT CI - model-assisted CI helpers
//!
//! Provides two sequential pipelines:
//! - [`FixLoop`]: run tests, localize the failing file, request a patch,
//!   apply it and verify with a second test run
//! - [`PlanPipeline`]: collect a diff, ask for a CI plan, validate it and
//!   append `key=value` directives for the CI platform

pub mod changes;
pub mod fix_loop;
pub mod inventory;
pub mod locate;
pub mod output;
pub mod patch;
pub mod plan;
pub mod plan_pipeline;
pub mod runner;
pub mod stage;
pub mod validate;

// Re-export key types
pub use changes::{ChangeSet, DiffCollector};
pub use fix_loop::{FixLoop, FixOutcome, FixSettings, SUCCESS_MARKER};
pub use inventory::discover_tests;
pub use locate::{FailureLocation, FailureLocator};
pub use output::{fail_open_directives, plan_directives, Directive, OutputSink};
pub use patch::{sanitize_patch, PatchRequest, PatchRequester, PatchResponse};
pub use plan::{parse_plan, CiPlan, PlanRequester, Selection};
pub use plan_pipeline::{PlanOutcome, PlanPipeline, PlanSettings};
pub use runner::{TestResult, TestRunner};
pub use stage::{BuiltinStage, StageConfig};
pub use validate::validate_paths;
