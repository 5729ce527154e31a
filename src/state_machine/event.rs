//! Events that can occur in a settlement dialogue

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Text message received from the chat
    UserMessage { text: String },

    /// Every amount is recorded; produced by the runtime after
    /// [`Effect::RequestSettlement`](super::Effect::RequestSettlement)
    SettleRequested,
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Event::UserMessage { text: text.into() }
    }
}
