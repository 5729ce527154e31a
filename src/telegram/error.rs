//! Telegram Bot API error types

use std::time::Duration;
use thiserror::Error;

/// Bot API error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TelegramError {
    pub kind: TelegramErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl TelegramError {
    pub fn new(kind: TelegramErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Decode, message)
    }

    /// Classify a failed API call by its `error_code`
    pub fn from_api(error_code: Option<u16>, description: &str) -> Self {
        let kind = match error_code {
            Some(401 | 404) => TelegramErrorKind::Auth,
            Some(403) => TelegramErrorKind::Forbidden,
            Some(429) => TelegramErrorKind::RateLimit,
            Some(400) => TelegramErrorKind::InvalidRequest,
            Some(code) if code >= 500 => TelegramErrorKind::Server,
            _ => TelegramErrorKind::Unknown,
        };
        let message = match error_code {
            Some(code) => format!("Bot API error {code}: {description}"),
            None => format!("Bot API error: {description}"),
        };
        Self::new(kind, message)
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the bot token
        let e = e.without_url();
        if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}

/// Error classification for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramErrorKind {
    /// Connection failures, timeouts - retryable
    Network,
    /// Too many requests (429) - retryable after `retry_after`
    RateLimit,
    /// Server error (5xx) - retryable
    Server,
    /// Token rejected (401, or 404 for an unknown bot) - fatal
    Auth,
    /// Bot blocked or kicked from the chat (403)
    Forbidden,
    /// Bad request (400) - not retryable
    InvalidRequest,
    /// Response body was not a Bot API envelope
    Decode,
    /// Unknown error
    Unknown,
}

impl TelegramErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::Server)
    }
}
