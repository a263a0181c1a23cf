//! Patch requests: ask the completion service to rewrite a failing file.

use cipilot_core::{ChatMessage, CompletionRequest, CompletionService, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Default sampling temperature for patch requests.
pub const PATCH_TEMPERATURE: f32 = 0.1;

/// Everything the model sees about one failing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub file_path: String,
    pub original_source: String,
    pub error_log: String,
}

/// The model's replacement source, fences removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResponse {
    pub sanitized_source: String,
}

/// Builds patch prompts and cleans up the replies.
#[derive(Debug, Clone)]
pub struct PatchRequester {
    /// Language label used in the prompt and code fence, e.g. "TypeScript".
    pub language: String,
    pub temperature: f32,
}

impl Default for PatchRequester {
    fn default() -> Self {
        Self {
            language: "TypeScript".to_string(),
            temperature: PATCH_TEMPERATURE,
        }
    }
}

impl PatchRequester {
    /// Build the completion request for `patch`.
    pub fn build_request(&self, patch: &PatchRequest) -> CompletionRequest {
        let fence = self.language.to_ascii_lowercase();
        let prompt = format!(
            "You are an Expert {language} Developer.\n\
             \n\
             The unit tests are failing.\n\
             File: {path}\n\
             \n\
             Code:\n\
             ```{fence}\n\
             {code}\n\
             ```\n\
             \n\
             Error Stack Trace:\n\
             {log}\n\
             \n\
             Task: Fix the code in {path} so the tests pass.\n\
             Return ONLY the raw {language} code. No markdown, no comments outside code.\n",
            language = self.language,
            path = patch.file_path,
            code = patch.original_source,
            log = patch.error_log,
        );

        CompletionRequest::new(vec![
            ChatMessage::system(format!("You output only valid {} code.", self.language)),
            ChatMessage::user(prompt),
        ])
        .with_temperature(self.temperature)
    }

    /// Send `patch` to `service` and return the sanitized replacement.
    ///
    /// The reply is not validated before the caller writes it back.
    pub async fn request(
        &self,
        service: &dyn CompletionService,
        patch: &PatchRequest,
    ) -> Result<PatchResponse> {
        debug!(file = %patch.file_path, log_chars = patch.error_log.len(), "Requesting patch");
        let reply = service.complete(&self.build_request(patch)).await?;
        Ok(PatchResponse {
            sanitized_source: sanitize_patch(&reply),
        })
    }
}

fn opening_fence() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^```[A-Za-z0-9_+\-]*").expect("static fence pattern compiles")
    })
}

fn closing_fence() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)```[ \t]*$").expect("static fence pattern compiles")
    })
}

/// Strip code-fence markers from a model reply and trim it.
pub fn sanitize_patch(reply: &str) -> String {
    let without_open = opening_fence().replace_all(reply, "");
    let without_close = closing_fence().replace_all(&without_open, "");
    without_close.trim().to_string()
}
