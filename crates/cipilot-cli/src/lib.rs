//! Shared plumbing for the `ai-fix` and `ci-plan` binaries.

use std::path::PathBuf;
use std::sync::Arc;

use cipilot_core::{AzureOpenAiClient, CompletionConfig, CompletionService};
use clap::Args;
use tracing::Level;

/// Flags every CIPILOT binary accepts. None are required.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Working tree to operate on (default: current directory)
    #[arg(short = 'C', long, default_value = ".")]
    pub workspace: PathBuf,
}

impl GlobalArgs {
    /// Set up logging for this invocation.
    pub fn init_tracing(&self) {
        let level = if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };
        cipilot_core::init_tracing(self.json, level);
    }
}

/// Build the production completion client from environment configuration.
pub fn connect_from_env() -> cipilot_core::Result<Arc<dyn CompletionService>> {
    let config = CompletionConfig::from_env()?;
    tracing::debug!(?config, "Connecting to completion service");
    Ok(Arc::new(AzureOpenAiClient::new(config)?))
}
