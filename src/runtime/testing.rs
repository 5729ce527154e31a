//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::state_machine::ChatId;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Recording Messenger
// ============================================================================

/// Messenger that records every reply
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(ChatId, String)>>,
    /// Notified after each recorded reply
    pub reply_sent: Notify,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replies sent to one chat, oldest first
    pub fn replies_for(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Wait until at least `count` replies went to `chat_id`
    pub async fn wait_for_replies(&self, chat_id: ChatId, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.reply_sent.notified();
            if self.replies_for(chat_id).len() >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.replies_for(chat_id).len() >= count;
            }
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        self.reply_sent.notify_waiters();
        Ok(())
    }
}

// ============================================================================
// Failing Messenger
// ============================================================================

/// Messenger whose sends always fail, counting attempts
#[derive(Default)]
pub struct FailingMessenger {
    pub attempts: Mutex<Vec<(ChatId, String)>>,
}

#[async_trait]
impl Messenger for FailingMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), String> {
        self.attempts
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        Err("network unreachable".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;
    use crate::runtime::RuntimeManager;
    use tokio_util::sync::CancellationToken;

    const WAIT: Duration = Duration::from_secs(2);

    fn manager(
        messenger: &Arc<RecordingMessenger>,
        idle_timeout: Duration,
    ) -> RuntimeManager<Arc<RecordingMessenger>> {
        RuntimeManager::new(
            Arc::clone(messenger),
            Some("tabsplit_bot".to_string()),
            idle_timeout,
            CancellationToken::new(),
        )
    }

    async fn send_all(
        manager: &RuntimeManager<Arc<RecordingMessenger>>,
        chat_id: ChatId,
        inputs: &[&str],
    ) {
        for input in inputs {
            manager.dispatch(chat_id, (*input).to_string()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_recording_messenger() {
        let messenger = RecordingMessenger::new();
        messenger.send_text(1, "hi").await.unwrap();
        messenger.send_text(2, "there").await.unwrap();

        assert_eq!(messenger.replies_for(1), vec!["hi"]);
        assert_eq!(messenger.total_sent(), 2);
    }

    #[tokio::test]
    async fn test_full_round_through_runtime() {
        let messenger = RecordingMessenger::new();
        let manager = manager(&messenger, Duration::from_secs(60));

        let inputs = ["/start", "3", "A", "B", "C", "90", "30", "60"];
        send_all(&manager, 10, &inputs).await;

        assert!(messenger.wait_for_replies(10, inputs.len(), WAIT).await);
        let replies = messenger.replies_for(10);
        assert_eq!(replies.len(), inputs.len());
        assert_eq!(replies[0], messages::ASK_COUNT);
        assert_eq!(
            replies.last().unwrap(),
            "All amounts entered!\nPayment plan:\nB should send A 30.00"
        );

        // Session is back before the count step
        send_all(&manager, 10, &["3"]).await;
        assert!(messenger.wait_for_replies(10, inputs.len() + 1, WAIT).await);
        assert_eq!(messenger.replies_for(10).last().unwrap(), messages::INVALID_START);
    }

    #[tokio::test]
    async fn test_chats_are_isolated() {
        let messenger = RecordingMessenger::new();
        let manager = manager(&messenger, Duration::from_secs(60));

        send_all(&manager, 1, &["/start", "2", "A"]).await;
        send_all(&manager, 2, &["/start", "2", "A"]).await;

        assert!(messenger.wait_for_replies(1, 3, WAIT).await);
        assert!(messenger.wait_for_replies(2, 3, WAIT).await);
        // "A" is new in chat 2 even though chat 1 already has it
        assert_eq!(messenger.replies_for(2)[2], messages::name_prompt(2));
        assert_eq!(manager.active_sessions().await, 2);
    }

    #[tokio::test]
    async fn test_idle_session_is_evicted() {
        let messenger = RecordingMessenger::new();
        let manager = manager(&messenger, Duration::from_millis(100));

        send_all(&manager, 5, &["/start"]).await;
        assert!(messenger.wait_for_replies(5, 1, WAIT).await);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(manager.active_sessions().await, 0);

        // A fresh session ignores the count it would have expected
        send_all(&manager, 5, &["3"]).await;
        assert!(messenger.wait_for_replies(5, 2, WAIT).await);
        assert_eq!(messenger.replies_for(5)[1], messages::START_HINT);
    }

    #[tokio::test]
    async fn test_failed_send_does_not_stall_dialogue() {
        let messenger = Arc::new(FailingMessenger::default());
        let manager = RuntimeManager::new(
            Arc::clone(&messenger),
            None,
            Duration::from_secs(60),
            CancellationToken::new(),
        );

        for input in ["/start", "2"] {
            manager.dispatch(3, input.to_string()).await.unwrap();
        }

        let deadline = tokio::time::Instant::now() + WAIT;
        while messenger.attempts.lock().unwrap().len() < 2 {
            assert!(tokio::time::Instant::now() < deadline, "runtime stalled");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let attempts = messenger.attempts.lock().unwrap().clone();
        assert!(attempts[1].1.ends_with(&messages::name_prompt(1)));
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_fails() {
        let messenger = RecordingMessenger::new();
        let shutdown = CancellationToken::new();
        let manager = RuntimeManager::new(
            Arc::clone(&messenger),
            None,
            Duration::from_secs(60),
            shutdown.clone(),
        );

        shutdown.cancel();

        assert!(manager.dispatch(1, "/start".to_string()).await.is_err());
        assert_eq!(messenger.total_sent(), 0);
    }
}
