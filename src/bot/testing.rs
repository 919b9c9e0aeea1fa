//! Test doubles for the transport and the generation collaborator
//!
//! These let the full runtime run without Telegram or a model provider.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::dialogue::SessionId;
use crate::generation::{GenerationError, GenerationRequest, TextGenerator};

use super::dialogue_manager::{Keyboard, Outbound};
use super::transport::Transport;

/// Transport that records every message instead of sending it
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Outbound>>,
    fail_sends: Mutex<bool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far
    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages sent to one session
    pub fn sent_to(&self, session_id: SessionId) -> Vec<Outbound> {
        self.sent()
            .into_iter()
            .filter(|outbound| outbound.session_id == session_id)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Make subsequent sends fail
    pub fn set_failing(&self, failing: bool) {
        *self.fail_sends.lock().unwrap() = failing;
    }

    fn record(&self, session_id: SessionId, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        if *self.fail_sends.lock().unwrap() {
            return Err(anyhow!("transport unavailable"));
        }
        self.sent.lock().unwrap().push(Outbound {
            session_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, session_id: SessionId, text: &str) -> Result<()> {
        self.record(session_id, text, None)
    }

    async fn send_with_keyboard(
        &self,
        session_id: SessionId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.record(session_id, text, Some(keyboard))
    }
}

/// Generator returning queued outcomes, falling back to an echo of the request
#[derive(Default)]
pub struct MockGenerator {
    outcomes: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_text(&self, text: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: GenerationError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Requests received so far
    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("generated: {}", request.brief)))
    }
}
