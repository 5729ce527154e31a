//! Telegram Bot API transport
//!
//! Minimal long-polling client: `getMe`, `getUpdates` and `sendMessage`.

mod error;
mod types;

pub use error::{TelegramError, TelegramErrorKind};
pub use types::{Message, Update, User};

use crate::config::BotConfig;
use crate::runtime::Messenger;
use crate::state_machine::ChatId;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use types::{ApiResponse, GetUpdates, NoParams, SendMessage};

/// Longest text `sendMessage` accepts, in characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Slack on top of the long-poll timeout before the HTTP request gives up
const REQUEST_MARGIN: Duration = Duration::from_secs(10);

/// Bot API client
pub struct TelegramClient {
    client: Client,
    /// `{api_url}/bot{token}`, never logged
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(config.poll_timeout + REQUEST_MARGIN)
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url, config.token),
            poll_timeout: config.poll_timeout,
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(params)
            .send()
            .await?;

        // Failed calls still carry the JSON envelope, whatever the status
        let status = response.status();
        let body = response.text().await?;
        let envelope: ApiResponse<R> = serde_json::from_str(&body)
            .map_err(|e| undecodable_body(method, status, &e))?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                ok: true,
                result: None,
                ..
            } => Err(TelegramError::decode(format!("{method}: response without result"))),
            ApiResponse {
                description,
                error_code,
                parameters,
                ..
            } => {
                let code = error_code.or(Some(status.as_u16()));
                let description = description.unwrap_or_else(|| "no description".to_string());
                let mut err = TelegramError::from_api(code, &description);
                if let Some(secs) = parameters.and_then(|p| p.retry_after) {
                    err = err.with_retry_after(Duration::from_secs(secs));
                }
                Err(err)
            }
        }
    }

    /// Identity of the bot behind the token
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &NoParams {}).await
    }

    /// Long-poll for updates after `offset`
    ///
    /// Updates that do not decode are skipped individually so one odd payload
    /// cannot stall the offset.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdates {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let raw: Vec<Value> = self.call("getUpdates", &params).await?;
        Ok(decode_updates(raw))
    }

    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<Message, TelegramError> {
        self.call("sendMessage", &SendMessage { chat_id, text }).await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), String> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            self.send_message(chat_id, &chunk)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Error for a body that is not a Bot API envelope
///
/// Proxies answer failures with their own pages, so a failing status is
/// classified like an API error; a successful one is a decode error.
fn undecodable_body(
    method: &str,
    status: StatusCode,
    error: &serde_json::Error,
) -> TelegramError {
    let message = format!("{method}: HTTP {status}, undecodable body: {error}");
    if status.is_success() {
        TelegramError::decode(message)
    } else {
        TelegramError::from_api(Some(status.as_u16()), &message)
    }
}

/// Decode raw updates, keeping the id of undecodable ones so the offset still
/// moves past them
fn decode_updates(raw: Vec<Value>) -> Vec<Update> {
    raw.into_iter()
        .filter_map(|value| {
            let update_id = value.get("update_id").and_then(Value::as_i64);
            match serde_json::from_value::<Update>(value) {
                Ok(update) => Some(update),
                Err(e) => {
                    tracing::warn!(update_id, error = %e, "Skipping undecodable update");
                    update_id.map(|update_id| Update {
                        update_id,
                        message: None,
                    })
                }
            }
        })
        .collect()
}

/// Split `text` into pieces of at most `limit` characters, preferring line
/// boundaries
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let separator = usize::from(!current.is_empty());

        if current_len + separator + line_len <= limit {
            if separator == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += separator + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        // Overlong line: hard split by characters
        let mut chars = line.chars().peekable();
        while chars.peek().is_some() {
            let piece: String = chars.by_ref().take(limit).collect();
            current_len = piece.chars().count();
            if current_len == limit {
                chunks.push(piece);
                current_len = 0;
            } else {
                current = piece;
            }
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
