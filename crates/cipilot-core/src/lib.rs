//! CIPILOT Core Library
//!
//! Shared plumbing for the CIPILOT pipelines: configuration, the
//! completion-service client, working-tree helpers and tracing setup.

pub mod ansi;
pub mod completion;
pub mod config;
pub mod error;
pub mod fakes;
pub mod git;
pub mod obs;
pub mod telemetry;
pub mod workspace;

pub use ansi::strip_ansi;
pub use completion::{
    AzureOpenAiClient, ChatMessage, CompletionError, CompletionRequest, CompletionService,
    ResponseFormat, Role,
};
pub use config::CompletionConfig;
pub use error::{CipilotError, Result};
pub use git::{git_output, is_git_repo};
pub use obs::run_span;
pub use telemetry::init_tracing;
pub use workspace::{content_digest, exists_in, is_contained, write_atomic};

/// CIPILOT version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
