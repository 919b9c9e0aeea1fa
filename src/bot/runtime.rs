//! Runtime wiring the dialog controller to the transport and the scheduler.
//!
//! Transitions run under the controller lock; their effects are executed
//! after the lock is released. Telegram's dispatcher feeds updates of one
//! chat sequentially, which gives the per-session ordering.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::dialogue::{Session, SessionId};
use crate::scheduler::{GenerationCompletion, GenerationScheduler};

use super::dialogue_manager::{DialogController, Effect};
use super::transport::Transport;

pub struct DialogRuntime {
    controller: Mutex<DialogController>,
    transport: Arc<dyn Transport>,
    scheduler: GenerationScheduler,
}

impl DialogRuntime {
    pub fn new(
        controller: DialogController,
        transport: Arc<dyn Transport>,
        scheduler: GenerationScheduler,
    ) -> Arc<Self> {
        Arc::new(Self {
            controller: Mutex::new(controller),
            transport,
            scheduler,
        })
    }

    /// Handle an inbound text message for a session
    pub async fn handle_text(&self, session_id: SessionId, text: &str) -> Result<()> {
        debug!(session_id = %session_id, message_length = text.len(), "Received text message");
        let effects = self.controller.lock().await.handle_inbound(session_id, text);
        self.execute(effects).await
    }

    /// Handle the result of a scheduled generation
    pub async fn handle_completion(&self, completion: GenerationCompletion) -> Result<()> {
        let effects = self.controller.lock().await.handle_completion(completion);
        self.execute(effects).await
    }

    /// Feed completions from the scheduler back into the controller until the channel closes
    pub fn spawn_completion_loop(
        self: &Arc<Self>,
        mut completions: mpsc::UnboundedReceiver<GenerationCompletion>,
    ) -> JoinHandle<()> {
        let runtime = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(completion) = completions.recv().await {
                let session_id = completion.task.session_id;
                if let Err(e) = runtime.handle_completion(completion).await {
                    error!(session_id = %session_id, error = %e, "Failed to handle generation result");
                }
            }
            debug!("Generation completion channel closed");
        })
    }

    /// Copy of a session's current data
    pub async fn session(&self, session_id: SessionId) -> Option<Session> {
        self.controller.lock().await.session(session_id).cloned()
    }

    pub async fn active_sessions(&self) -> usize {
        self.controller.lock().await.active_sessions()
    }

    async fn execute(&self, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::Send(outbound) => {
                    // A failed send must not stop the remaining effects
                    if let Err(e) = self.transport.deliver(&outbound).await {
                        error!(session_id = %outbound.session_id, error = %e, "Failed to send message");
                    }
                }
                Effect::ScheduleGeneration(task) => {
                    self.scheduler.schedule(task);
                }
            }
        }
        Ok(())
    }
}
