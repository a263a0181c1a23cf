//! In-memory fakes for the completion service (testing only)
//!
//! Provides `ScriptedCompletion` and `FailingCompletion` that satisfy the
//! [`CompletionService`] contract without any network access. Both record
//! every request they receive.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::completion::{CompletionError, CompletionRequest, CompletionService};

// ---------------------------------------------------------------------------
// ScriptedCompletion
// ---------------------------------------------------------------------------

/// Replies with canned responses in order; errors once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(CompletionError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// FailingCompletion
// ---------------------------------------------------------------------------

/// Fails every request with a transport error.
#[derive(Debug)]
pub struct FailingCompletion {
    message: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FailingCompletion {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for FailingCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        Err(CompletionError::Http(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::ChatMessage;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new(vec![ChatMessage::user(text)])
    }

    #[tokio::test]
    async fn scripted_replies_in_order_then_errors() {
        let fake = ScriptedCompletion::new(["one", "two"]);
        assert_eq!(fake.complete(&request("a")).await.unwrap(), "one");
        assert_eq!(fake.complete(&request("b")).await.unwrap(), "two");
        assert!(fake.complete(&request("c")).await.is_err());
        assert_eq!(fake.call_count(), 3);
        assert_eq!(fake.requests()[1], request("b"));
    }

    #[tokio::test]
    async fn failing_records_and_errors() {
        let fake = FailingCompletion::new("connection refused");
        let err = fake.complete(&request("a")).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(fake.call_count(), 1);
    }
}
