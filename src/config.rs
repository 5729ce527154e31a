//! Bot configuration from the environment

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_IDLE_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
    #[error("{var} has invalid value {value:?}, expected a positive number of seconds")]
    Invalid { var: &'static str, value: String },
}

/// Runtime configuration
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    /// Bot API base URL without trailing slash
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates`
    pub poll_timeout: Duration,
    /// Sessions idle this long are dropped
    pub session_idle: Duration,
}

// Keeps the token out of logs
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("session_idle", &self.session_idle)
            .finish()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let api_url = lookup("TABSPLIT_API_URL")
            .filter(|u| !u.trim().is_empty())
            .map_or_else(
                || DEFAULT_API_URL.to_string(),
                |u| u.trim().trim_end_matches('/').to_string(),
            );

        let poll_timeout = seconds(
            &lookup,
            "TABSPLIT_POLL_TIMEOUT_SECS",
            DEFAULT_POLL_TIMEOUT_SECS,
        )?;
        let session_idle = seconds(
            &lookup,
            "TABSPLIT_SESSION_IDLE_SECS",
            DEFAULT_SESSION_IDLE_SECS,
        )?;

        Ok(Self {
            token,
            api_url,
            poll_timeout,
            session_idle,
        })
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(Duration::from_secs(default));
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid { var, value }),
    }
}
