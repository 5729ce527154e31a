//! Dialogue state and per-chat session data

/// Telegram chat id, the identity a session is keyed by
pub type ChatId = i64;

// ============================================================================
// Dialogue State
// ============================================================================

/// Step of the settlement dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Never talked to this chat (or the session was evicted)
    #[default]
    Idle,

    /// Previous round finished, waiting for the start command again
    AwaitingStart,

    /// Waiting for the number of participants
    AwaitingCount,

    /// Collecting participant names, `fill_index` names recorded so far
    AwaitingName,

    /// Collecting amounts, `fill_index` amounts recorded so far
    AwaitingAmount,

    /// All amounts recorded, settlement pending
    Complete,
}

// ============================================================================
// Session
// ============================================================================

/// Everything collected so far for one chat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub state: DialogState,
    /// Number of participants, zero until the count is accepted
    pub participant_count: usize,
    /// Participant names in entry order
    pub names: Vec<String>,
    /// Spent amount per participant, in the same order as `names`
    pub amounts: Vec<(String, f64)>,
    /// Names recorded in the name phase, amounts recorded in the amount phase
    pub fill_index: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh session for the next round, keeping only the fact that this chat
    /// has already been greeted
    pub fn next_round() -> Self {
        Self {
            state: DialogState::AwaitingStart,
            ..Self::default()
        }
    }

    /// Session right after a valid participant count
    pub fn collecting_names(participant_count: usize) -> Self {
        Self {
            state: DialogState::AwaitingName,
            participant_count,
            names: Vec::new(),
            amounts: Vec::new(),
            fill_index: 0,
        }
    }

    /// Name whose amount is asked for next
    pub fn current_participant(&self) -> Option<&str> {
        match self.state {
            DialogState::AwaitingAmount => self.names.get(self.fill_index).map(String::as_str),
            _ => None,
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Check that the recorded data matches what the state implies
    pub fn is_consistent(&self) -> bool {
        match self.state {
            DialogState::Idle | DialogState::AwaitingStart | DialogState::AwaitingCount => {
                self.participant_count == 0
                    && self.names.is_empty()
                    && self.amounts.is_empty()
                    && self.fill_index == 0
            }
            DialogState::AwaitingName => {
                self.participant_count > 0
                    && self.fill_index < self.participant_count
                    && self.names.len() == self.fill_index
                    && self.amounts.is_empty()
            }
            DialogState::AwaitingAmount => {
                self.participant_count > 0
                    && self.fill_index < self.participant_count
                    && self.names.len() == self.participant_count
                    && self.amounts.len() == self.fill_index
                    && self.amounts_follow_names()
            }
            DialogState::Complete => {
                self.participant_count > 0
                    && self.fill_index == self.participant_count
                    && self.names.len() == self.participant_count
                    && self.amounts.len() == self.participant_count
                    && self.amounts_follow_names()
            }
        }
    }

    fn amounts_follow_names(&self) -> bool {
        self.amounts
            .iter()
            .zip(&self.names)
            .all(|((name, amount), expected)| name == expected && *amount >= 0.0)
    }
}

// ============================================================================
// Dialogue Context
// ============================================================================

/// Context for a dialogue (immutable configuration)
#[derive(Debug, Clone)]
pub struct DialogContext {
    pub chat_id: ChatId,
    /// Bot username without the leading `@`, for `/start@name` in groups
    pub bot_username: Option<String>,
}

impl DialogContext {
    pub fn new(chat_id: ChatId, bot_username: Option<String>) -> Self {
        Self {
            chat_id,
            bot_username,
        }
    }

    /// Check whether `text` is the start command addressed to this bot
    pub fn is_start_command(&self, text: &str) -> bool {
        let text = text.trim();
        match text.split_once('@') {
            None => text == START_COMMAND,
            Some((command, target)) => {
                command == START_COMMAND
                    && self
                        .bot_username
                        .as_deref()
                        .is_some_and(|name| name.eq_ignore_ascii_case(target))
            }
        }
    }
}

/// The only command the dialogue reacts to
pub const START_COMMAND: &str = "/start";
