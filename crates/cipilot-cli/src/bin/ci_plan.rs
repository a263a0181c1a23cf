//! `ci-plan`: decide which CI stages a diff needs and append the decision
//! as `key=value` lines to `$GITHUB_OUTPUT` (or `output.txt`).
//!
//! Always exits 0 unless the output sink cannot be written.

use anyhow::{Context, Result};
use cipilot_ci::{DiffCollector, PlanPipeline, PlanSettings};
use cipilot_cli::{connect_from_env, GlobalArgs};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "ci-plan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Select the CI stages a change needs", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Comparison base for the diff
    #[arg(long, env = "CIPILOT_BASE_REF", default_value = "origin/main...HEAD")]
    base_ref: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.global.init_tracing();

    let settings = PlanSettings {
        collector: DiffCollector {
            base_ref: cli.base_ref,
            ..DiffCollector::default()
        },
        ..PlanSettings::default()
    };
    info!(
        base = %settings.collector.base_ref,
        sink = %settings.sink.path().display(),
        "Starting ci-plan"
    );

    PlanPipeline::run(&settings, &cli.global.workspace, connect_from_env)
        .await
        .with_context(|| format!("failed to write {}", settings.sink.path().display()))?;

    Ok(())
}
