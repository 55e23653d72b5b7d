//! Scripted mock chat provider.
//!
//! Replays a fixed sequence of responses and records every request it
//! receives. Used by pipeline tests and offline runs; no network involved.

use crate::client::{ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmUsage};
use mes_droits_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock chat client replaying scripted responses in order.
#[derive(Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockClient {
    /// Create an empty mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full response.
    pub fn push_response(&self, response: ChatResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Queue a response consisting of a single message.
    pub fn push_message(&self, message: ChatMessage) {
        self.push_response(ChatResponse {
            message,
            model: "mock".to_string(),
            usage: LlmUsage::default(),
            done: true,
        });
    }

    /// Number of responses still queued.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Requests received so far, in order.
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("Mock client script exhausted".to_string()))
    }
}
