//! Completion-service configuration.
//!
//! Endpoints and credentials are never compiled in; they are read from the
//! environment (or any other key lookup, for tests).

use std::fmt;

use crate::error::{CipilotError, Result};

pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";

pub const DEFAULT_API_VERSION: &str = "2024-10-21";
pub const DEFAULT_DEPLOYMENT: &str = "gpt-5-chat";

/// Connection settings for the completion service.
#[derive(Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Resource endpoint, e.g. `https://<resource>.openai.azure.com`
    pub endpoint: String,
    /// API key sent in the `api-key` header
    pub api_key: String,
    pub api_version: String,
    /// Deployment name (not the raw model id)
    pub deployment: String,
}

impl CompletionConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// Endpoint and key are required; version and deployment fall back to
    /// defaults. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| CipilotError::Config(format!("{key} is not set")))
        };

        Ok(Self {
            endpoint: require(ENV_ENDPOINT)?,
            api_key: require(ENV_API_KEY)?,
            api_version: get(ENV_API_VERSION).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            deployment: get(ENV_DEPLOYMENT).unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
        })
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .finish()
    }
}
