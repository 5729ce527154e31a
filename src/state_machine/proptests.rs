//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary message sequences.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> DialogContext {
    DialogContext::new(7, Some("tabsplit_bot".to_string()))
}

/// Apply an event the way the runtime does, chaining settlement requests
fn apply(session: &Session, event: Event) -> (Session, Vec<Effect>) {
    let mut pending = vec![event];
    let mut current = session.clone();
    let mut all_effects = Vec::new();

    while let Some(event) = pending.pop() {
        let result = transition(&current, &test_context(), event).expect("valid transition");
        current = result.session;
        for effect in result.effects {
            if effect == Effect::RequestSettlement {
                pending.push(Event::SettleRequested);
            }
            all_effects.push(effect);
        }
    }

    (current, all_effects)
}

fn reply_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Reply { .. }))
        .count()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_message() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/start".to_string()),
        Just("/start@tabsplit_bot".to_string()),
        Just("/help".to_string()),
        "[1-4]".prop_map(String::from),
        Just("-2".to_string()),
        Just("abc".to_string()),
        "[A-D]".prop_map(String::from),
        "[0-9]{1,4}(\\.[0-9]{1,2})?".prop_map(String::from),
        Just("-5".to_string()),
        Just(String::new()),
    ]
}

fn arb_messages() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_message(), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: session data always matches its state
    #[test]
    fn prop_sessions_stay_consistent(messages in arb_messages()) {
        let mut session = Session::new();
        for text in messages {
            let (next, _) = apply(&session, Event::user_message(text));
            prop_assert!(next.is_consistent(), "Inconsistent session: {:?}", next);
            prop_assert!(next.state != DialogState::Complete, "Settlement left pending");
            session = next;
        }
    }

    // Invariant 2: at most one reply per inbound message
    #[test]
    fn prop_one_reply_per_message(messages in arb_messages()) {
        let mut session = Session::new();
        for text in messages {
            let (next, effects) = apply(&session, Event::user_message(text));
            prop_assert_eq!(reply_count(&effects), 1);
            session = next;
        }
    }

    // Invariant 3: the cursor never moves backwards within a phase
    #[test]
    fn prop_cursor_monotonic_within_phase(messages in arb_messages()) {
        let mut session = Session::new();
        for text in messages {
            let (next, _) = apply(&session, Event::user_message(text));
            if next.state == session.state {
                prop_assert!(next.fill_index >= session.fill_index);
            }
            session = next;
        }
    }

    // Duplicate names never advance the cursor
    #[test]
    fn prop_duplicate_name_rejected(
        count in 2usize..6,
        names in proptest::collection::vec("[a-z]{1,6}", 1..5),
    ) {
        let (mut session, _) = apply(&Session::new(), Event::user_message("/start"));
        session = apply(&session, Event::user_message(count.to_string())).0;

        for name in names {
            if session.state != DialogState::AwaitingName {
                break;
            }
            let before = session.clone();
            let (next, _) = apply(&session, Event::user_message(name.clone()));
            if before.has_name(&name) {
                prop_assert_eq!(&next, &before);
            } else {
                prop_assert_eq!(next.fill_index % count, (before.fill_index + 1) % count);
            }
            session = next;
        }
    }

    // Negative amounts never get recorded
    #[test]
    fn prop_negative_amount_rejected(whole in 1u32..100_000, cents in 0u32..100) {
        let mut session = Session::new();
        for text in ["/start", "2", "A", "B"] {
            session = apply(&session, Event::user_message(text)).0;
        }

        let (next, _) = apply(&session, Event::user_message(format!("-{whole}.{cents:02}")));
        prop_assert_eq!(next, session);
    }

    // Completing a round always returns to the pre-count state
    #[test]
    fn prop_round_resets_session(
        amounts in proptest::collection::vec(0u32..1_000_000, 1..6),
    ) {
        let mut session = Session::new();
        session = apply(&session, Event::user_message("/start")).0;
        session = apply(&session, Event::user_message(amounts.len().to_string())).0;
        for i in 0..amounts.len() {
            session = apply(&session, Event::user_message(format!("p{i}"))).0;
        }
        let mut last_effects = Vec::new();
        for cents in &amounts {
            let (next, effects) = apply(&session, Event::user_message(format!("{}.{:02}", cents / 100, cents % 100)));
            session = next;
            last_effects = effects;
        }

        prop_assert_eq!(session, Session::next_round());
        let reported = last_effects.iter().any(|e| matches!(
            e,
            Effect::Reply { text } if text.starts_with(crate::messages::AMOUNTS_DONE)
        ));
        prop_assert!(reported);
    }
}
