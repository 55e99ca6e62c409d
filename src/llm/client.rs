//! LLM client trait and a scripted mock for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// One completion endpoint. Each call carries the whole transcript.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Replays scripted responses in order and records every request it receives.
///
/// Once the script is exhausted, further calls fail with [`AgentError::Llm`].
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Script that may include failures
    pub fn with_results(results: Vec<Result<CompletionResponse>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .map_err(|e| AgentError::Llm(e.to_string()))?
            .push(request);

        self.responses
            .lock()
            .map_err(|e| AgentError::Llm(e.to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Llm("mock script exhausted".to_string())))
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
