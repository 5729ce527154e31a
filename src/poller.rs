//! Long-polling loop feeding inbound messages to the dialogue runtimes

use crate::runtime::{Messenger, RuntimeManager};
use crate::telegram::{TelegramClient, TelegramError, TelegramErrorKind, Update};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Source of inbound updates
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Next batch of updates with an id of at least `offset`
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        self.get_updates(offset).await
    }
}

/// Poll `source` until shutdown, routing text messages to `manager`
///
/// Network, rate-limit and server errors are retried with backoff; any other
/// error stops polling and is returned.
pub async fn run_polling<S, M>(
    source: &S,
    manager: &RuntimeManager<M>,
    shutdown: &CancellationToken,
) -> Result<(), TelegramError>
where
    S: UpdateSource,
    M: Messenger + Clone + 'static,
{
    let mut offset: Option<i64> = None;
    let mut failures: u32 = 0;

    tracing::info!("Polling for updates");

    loop {
        let batch = tokio::select! {
            () = shutdown.cancelled() => break,
            batch = source.fetch_updates(offset) => batch,
        };

        match batch {
            Ok(updates) => {
                failures = 0;
                for update in updates {
                    offset = Some(update.update_id + 1);
                    route(manager, &update).await;
                }
            }
            Err(e) if e.kind == TelegramErrorKind::Auth => {
                tracing::error!(error = %e, "Bot token rejected");
                return Err(e);
            }
            Err(e) if !e.kind.is_retryable() => {
                // Same request would fail the same way
                tracing::error!(error = %e, kind = ?e.kind, "Polling failed permanently");
                return Err(e);
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = retry_delay(failures, e.retry_after);
                tracing::warn!(
                    error = %e,
                    kind = ?e.kind,
                    attempt = failures,
                    delay_ms = %delay.as_millis(),
                    "Polling failed, backing off"
                );
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    tracing::info!("Polling stopped");
    Ok(())
}

async fn route<M: Messenger + Clone + 'static>(manager: &RuntimeManager<M>, update: &Update) {
    let Some((chat_id, text)) = update.text_message() else {
        tracing::debug!(update_id = update.update_id, "Skipping update without text");
        return;
    };

    if let Some(message) = &update.message {
        tracing::debug!(
            update_id = update.update_id,
            message_id = message.message_id,
            chat_id,
            chat_type = %message.chat.kind,
            from = ?message.from.as_ref().map(|u| u.id),
            "Inbound message"
        );
    }

    if let Err(e) = manager.dispatch(chat_id, text.to_string()).await {
        tracing::warn!(chat_id, error = %e, "Dropping inbound message");
    }
}

/// Server-provided delay if any, else exponential backoff with jitter:
/// 1s, 2s, 4s ... capped at 30s
fn retry_delay(attempt: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(delay) = retry_after {
        return delay;
    }
    let exponent = attempt.saturating_sub(1).min(5);
    let base = Duration::from_secs(1 << exponent).min(MAX_BACKOFF);
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..250));
    base + jitter
}
