//! # Generation Scheduler Module
//!
//! Generation runs as a delayed one-shot tokio task. The task carries the
//! session identifier, cycle epoch and request sequence it was scheduled for;
//! its result is sent back over a channel so the runtime can route it to the
//! owning session.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dialogue::SessionId;
use crate::generation::{GenerationError, GenerationRequest, TextGenerator};

/// A generation scheduled on behalf of one session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationTask {
    pub session_id: SessionId,
    pub cycle: u64,
    pub request_seq: u64,
    pub request: GenerationRequest,
}

/// Result of a scheduled generation
#[derive(Debug)]
pub struct GenerationCompletion {
    pub task: GenerationTask,
    pub outcome: Result<String, GenerationError>,
}

#[derive(Clone)]
pub struct GenerationScheduler {
    generator: Arc<dyn TextGenerator>,
    delay: Duration,
    completions: mpsc::UnboundedSender<GenerationCompletion>,
}

impl GenerationScheduler {
    /// Create a scheduler and the receiver its completions are delivered to
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<GenerationCompletion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        (
            Self {
                generator,
                delay,
                completions,
            },
            receiver,
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run the task after the configured delay
    pub fn schedule(&self, task: GenerationTask) -> JoinHandle<()> {
        let generator = Arc::clone(&self.generator);
        let completions = self.completions.clone();
        let delay = self.delay;

        debug!(
            session_id = %task.session_id,
            cycle = task.cycle,
            request_seq = task.request_seq,
            delay_ms = delay.as_millis() as u64,
            "Scheduling text generation"
        );

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let outcome = generator.generate(&task.request).await;
            let session_id = task.session_id;

            if completions.send(GenerationCompletion { task, outcome }).is_err() {
                warn!(session_id = %session_id, "Completion receiver closed, dropping generation result");
            }
        })
    }
}
