//! `ai-fix`: run the unit tests; on failure, ask the model to rewrite the
//! implicated file and verify the result.
//!
//! Exit codes: 0 when tests already pass, no failing file could be found,
//! or the fix was verified; 1 when the fix did not verify.

use std::process::ExitCode;

use anyhow::{Context, Result};
use cipilot_ci::{FixLoop, FixSettings, StageConfig};
use cipilot_cli::{connect_from_env, GlobalArgs};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "ai-fix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Localize a failing test, request a fix, and verify it", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Test command to run (whitespace-separated)
    #[arg(long, env = "CIPILOT_TEST_COMMAND", default_value = "npm run test")]
    test_command: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli.global.init_tracing();

    let settings = FixSettings {
        test_stage: StageConfig::from_command_line("unit_tests", &cli.test_command, 0),
        ..FixSettings::default()
    };
    info!(
        command = %settings.test_stage.display_command(),
        workspace = ?cli.global.workspace,
        "Starting ai-fix"
    );

    let outcome = FixLoop::run(&settings, &cli.global.workspace, connect_from_env)
        .await
        .context("ai-fix run failed")?;

    Ok(ExitCode::from(outcome.exit_code() as u8))
}
