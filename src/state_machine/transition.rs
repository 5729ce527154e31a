//! Pure state transition function
//!
//! Given the same session and event, `transition` always produces the same
//! new session and effects. It performs no I/O.

use super::{DialogContext, DialogState, Effect, Event, Session};
use crate::messages;
use crate::settlement::settle;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Input rejected by the current step; the step is asked again
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("participant count must be a positive integer")]
    InvalidCount,
    #[error("name #{ordinal} is empty")]
    EmptyName { ordinal: usize },
    #[error("name {name:?} is already taken")]
    DuplicateName { name: String, ordinal: usize },
    #[error("amount for {participant:?} must be a non-negative number")]
    InvalidAmount { participant: String },
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("session data does not match state {state:?}")]
    InconsistentSession { state: DialogState },
    #[error("no transition from {state:?} with event {event:?}")]
    UnexpectedEvent { state: DialogState, event: Event },
}

/// Pure transition function
pub fn transition(
    session: &Session,
    context: &DialogContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if !session.is_consistent() {
        return Err(TransitionError::InconsistentSession {
            state: session.state,
        });
    }

    match (session.state, event) {
        // ============================================================
        // Start
        // ============================================================
        (DialogState::Idle | DialogState::AwaitingStart, Event::UserMessage { text })
            if context.is_start_command(&text) =>
        {
            let next = Session {
                state: DialogState::AwaitingCount,
                ..Session::default()
            };
            Ok(TransitionResult::new(next).with_effect(Effect::reply(messages::ASK_COUNT)))
        }

        (DialogState::Idle, Event::UserMessage { .. }) => {
            Ok(TransitionResult::new(session.clone())
                .with_effect(Effect::reply(messages::START_HINT)))
        }

        (DialogState::AwaitingStart, Event::UserMessage { .. }) => {
            Ok(TransitionResult::new(session.clone())
                .with_effect(Effect::reply(messages::INVALID_START)))
        }

        // ============================================================
        // Collection
        // ============================================================
        (DialogState::AwaitingCount, Event::UserMessage { text }) => match parse_count(&text) {
            Ok(count) => Ok(TransitionResult::new(Session::collecting_names(count))
                .with_effect(Effect::reply(format!(
                    "{}\n{}",
                    messages::NAMES_INTRO,
                    messages::name_prompt(1)
                )))),
            Err(e) => Ok(reject(session, &e)),
        },

        (DialogState::AwaitingName, Event::UserMessage { text }) => {
            match validate_name(session, &text) {
                Ok(name) => Ok(accept_name(session, name)),
                Err(e) => Ok(reject(session, &e)),
            }
        }

        (DialogState::AwaitingAmount, Event::UserMessage { text }) => {
            // is_consistent guarantees a participant at the cursor
            let Some(participant) = session.current_participant() else {
                return Err(TransitionError::InconsistentSession {
                    state: session.state,
                });
            };
            match parse_amount(&text) {
                Some(amount) => Ok(accept_amount(session, participant, amount)),
                None => Ok(reject(
                    session,
                    &InputError::InvalidAmount {
                        participant: participant.to_string(),
                    },
                )),
            }
        }

        // ============================================================
        // Settlement
        // ============================================================
        (DialogState::Complete, Event::SettleRequested | Event::UserMessage { .. }) => {
            let transactions = settle(&session.amounts);
            Ok(TransitionResult::new(Session::next_round())
                .with_effect(Effect::reply(messages::settlement_report(&transactions))))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (
            state @ (DialogState::Idle
            | DialogState::AwaitingStart
            | DialogState::AwaitingCount
            | DialogState::AwaitingName
            | DialogState::AwaitingAmount),
            event @ Event::SettleRequested,
        ) => Err(TransitionError::UnexpectedEvent { state, event }),
    }
}

// Helper functions

fn reject(session: &Session, error: &InputError) -> TransitionResult {
    tracing::debug!(state = ?session.state, error = %error, "Input rejected");
    TransitionResult::new(session.clone()).with_effect(Effect::reply(messages::input_error(error)))
}

fn parse_count(text: &str) -> Result<usize, InputError> {
    match text.trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(InputError::InvalidCount),
    }
}

fn validate_name(session: &Session, text: &str) -> Result<String, InputError> {
    let ordinal = session.fill_index + 1;
    let name = text.trim();
    if name.is_empty() {
        return Err(InputError::EmptyName { ordinal });
    }
    if session.has_name(name) {
        return Err(InputError::DuplicateName {
            name: name.to_string(),
            ordinal,
        });
    }
    Ok(name.to_string())
}

fn accept_name(session: &Session, name: String) -> TransitionResult {
    let mut next = session.clone();
    next.names.push(name);
    next.fill_index += 1;

    if next.fill_index < next.participant_count {
        let prompt = messages::name_prompt(next.fill_index + 1);
        return TransitionResult::new(next).with_effect(Effect::reply(prompt));
    }

    next.fill_index = 0;
    next.state = DialogState::AwaitingAmount;
    let prompt = format!(
        "{}\n{}",
        messages::AMOUNTS_INTRO,
        messages::amount_prompt(&next.names[0])
    );
    TransitionResult::new(next).with_effect(Effect::reply(prompt))
}

/// Parse a non-negative finite amount; a decimal comma is accepted
fn parse_amount(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
        // "-0" parses as negative zero
        .map(|amount| amount + 0.0)
}

fn accept_amount(session: &Session, participant: &str, amount: f64) -> TransitionResult {
    let mut next = session.clone();
    next.amounts.push((participant.to_string(), amount));
    next.fill_index += 1;

    if let Some(name) = next.names.get(next.fill_index) {
        let prompt = messages::amount_prompt(name);
        return TransitionResult::new(next).with_effect(Effect::reply(prompt));
    }

    next.state = DialogState::Complete;
    TransitionResult::new(next).with_effect(Effect::RequestSettlement)
}
