//! Per-chat dialogue runtime executor

use super::traits::Messenger;
use super::Registry;

use crate::messages;
use crate::state_machine::{transition, DialogContext, Effect, Event, Session};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Runtime owning the session of one chat
///
/// Events for the chat arrive through `event_rx` and are handled strictly one
/// at a time, so a session is never touched concurrently.
pub struct DialogueRuntime<M: Messenger + 'static> {
    context: DialogContext,
    session: Session,
    messenger: M,
    event_rx: mpsc::UnboundedReceiver<Event>,
    /// Registry to leave when the session goes idle
    registry: Registry,
    idle_timeout: Duration,
    shutdown: CancellationToken,
}

impl<M: Messenger + 'static> DialogueRuntime<M> {
    pub fn new(
        context: DialogContext,
        messenger: M,
        event_rx: mpsc::UnboundedReceiver<Event>,
        registry: Registry,
        idle_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            context,
            session: Session::new(),
            messenger,
            event_rx,
            registry,
            idle_timeout,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let chat_id = self.context.chat_id;
        tracing::info!(chat_id, "Starting dialogue runtime");

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                event = self.event_rx.recv() => {
                    let Some(event) = event else { break };
                    if let Err(e) = self.process_event(event).await {
                        tracing::warn!(chat_id, error = %e, "Error handling event");
                    }
                }
                () = tokio::time::sleep(self.idle_timeout) => {
                    // Senders only deliver while holding the read lock, so an
                    // empty queue under the write lock means nothing is lost.
                    let mut runtimes = self.registry.write().await;
                    if self.event_rx.is_empty() {
                        runtimes.remove(&chat_id);
                        tracing::info!(chat_id, state = ?self.session.state, "Evicting idle session");
                        break;
                    }
                }
            }
        }

        tracing::info!(chat_id, "Dialogue runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), String> {
        // Settlement requests are chained inside the same inbound message
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            // Pure state transition
            let result = match transition(&self.session, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    // Session left untouched, the user gets the generic fallback
                    self.send_reply(messages::HELP_FALLBACK).await;
                    return Err(e.to_string());
                }
            };

            let old_state = self.session.state;
            self.session = result.session;
            tracing::debug!(
                chat_id = self.context.chat_id,
                from = ?old_state,
                to = ?self.session.state,
                fill_index = self.session.fill_index,
                "Transition"
            );

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Reply { text } => {
                self.send_reply(&text).await;
                None
            }
            Effect::RequestSettlement => {
                tracing::info!(
                    chat_id = self.context.chat_id,
                    participants = self.session.participant_count,
                    "Settling round"
                );
                Some(Event::SettleRequested)
            }
        }
    }

    /// Send failures are logged only; the dialogue has already moved on
    async fn send_reply(&self, text: &str) {
        if let Err(e) = self.messenger.send_text(self.context.chat_id, text).await {
            tracing::error!(chat_id = self.context.chat_id, error = %e, "Failed to send reply");
        }
    }
}
