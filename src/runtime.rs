//! Runtime for executing settlement dialogues
//!
//! Every chat gets its own runtime task that owns the chat's session. The
//! manager routes inbound messages to those tasks and creates them lazily.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::DialogueRuntime;
pub use traits::*;

use crate::state_machine::{ChatId, DialogContext, Event};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Live runtimes keyed by chat
pub(crate) type Registry = Arc<RwLock<HashMap<ChatId, ConversationHandle>>>;

/// Handle to interact with a running dialogue
pub struct ConversationHandle {
    pub event_tx: mpsc::UnboundedSender<Event>,
}

/// Manager for all dialogue runtimes
pub struct RuntimeManager<M: Messenger + Clone + 'static> {
    messenger: M,
    bot_username: Option<String>,
    idle_timeout: Duration,
    runtimes: Registry,
    shutdown: CancellationToken,
}

impl<M: Messenger + Clone + 'static> RuntimeManager<M> {
    pub fn new(
        messenger: M,
        bot_username: Option<String>,
        idle_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            messenger,
            bot_username,
            idle_timeout,
            runtimes: Arc::new(RwLock::new(HashMap::new())),
            shutdown,
        }
    }

    /// Route an inbound text message to the runtime of its chat
    ///
    /// Messages of one chat are queued in arrival order; the send happens while
    /// holding the registry lock so an idle runtime cannot leave in between.
    pub async fn dispatch(&self, chat_id: ChatId, text: String) -> Result<(), String> {
        if self.shutdown.is_cancelled() {
            return Err("Shutting down".to_string());
        }

        let mut event = Event::user_message(text);

        // Fast path: runtime already exists
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&chat_id) {
                match handle.event_tx.send(event) {
                    Ok(()) => return Ok(()),
                    Err(mpsc::error::SendError(returned)) => event = returned,
                }
            }
        }

        let mut runtimes = self.runtimes.write().await;
        if let Some(handle) = runtimes.get(&chat_id) {
            match handle.event_tx.send(event) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(returned)) => {
                    tracing::warn!(chat_id, "Replacing stopped dialogue runtime");
                    event = returned;
                }
            }
        }

        let handle = self.spawn_runtime(chat_id);
        handle
            .event_tx
            .send(event)
            .map_err(|_| format!("Runtime for chat {chat_id} stopped immediately"))?;
        runtimes.insert(chat_id, handle);
        Ok(())
    }

    /// Number of chats with a live session
    pub async fn active_sessions(&self) -> usize {
        self.runtimes.read().await.len()
    }

    fn spawn_runtime(&self, chat_id: ChatId) -> ConversationHandle {
        let context = DialogContext::new(chat_id, self.bot_username.clone());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let runtime = DialogueRuntime::new(
            context,
            self.messenger.clone(),
            event_rx,
            Arc::clone(&self.runtimes),
            self.idle_timeout,
            self.shutdown.child_token(),
        );

        tokio::spawn(async move {
            runtime.run().await;
        });

        ConversationHandle { event_tx }
    }
}
