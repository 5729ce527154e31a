//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::state_machine::ChatId;
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound side of the chat transport
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain text message to a chat
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), String> {
        (**self).send_text(chat_id, text).await
    }
}
