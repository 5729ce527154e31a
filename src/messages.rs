//! Reply texts sent to the chat

use crate::settlement::Transaction;
use crate::state_machine::InputError;

pub const START_HINT: &str = "Send /start to split a bill.";
pub const INVALID_START: &str = "Invalid input! Send /start.";
pub const ASK_COUNT: &str = "How many people are splitting the bill?";
pub const NAMES_INTRO: &str = "Great! Now enter distinct names.";
pub const AMOUNTS_INTRO: &str = "All names entered! Now enter the amounts.";
pub const AMOUNTS_DONE: &str = "All amounts entered!";
pub const NOTHING_TO_TRANSFER: &str = "Nobody needs to transfer anything!";
pub const HELP_FALLBACK: &str = "Something went wrong, see /help.";

pub fn name_prompt(ordinal: usize) -> String {
    format!("Enter the name of person #{ordinal}:")
}

pub fn amount_prompt(name: &str) -> String {
    format!("Enter the amount spent by {name}:")
}

/// Corrective prompt for rejected input
pub fn input_error(error: &InputError) -> String {
    match error {
        InputError::InvalidCount => "Please enter a valid number of people!".to_string(),
        InputError::EmptyName { ordinal } => {
            format!("A name can't be empty.\n{}", name_prompt(*ordinal))
        }
        InputError::DuplicateName { ordinal, .. } => {
            format!("Please enter distinct names.\n{}", name_prompt(*ordinal))
        }
        InputError::InvalidAmount { participant } => {
            format!("Please enter a valid amount!\n{}", amount_prompt(participant))
        }
    }
}

/// Final reply of a round: one line per transfer, or a notice that nobody owes
/// anything
pub fn settlement_report(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return format!("{AMOUNTS_DONE}\n{NOTHING_TO_TRANSFER}");
    }

    let lines: Vec<String> = transactions
        .iter()
        .map(|t| format!("{} should send {} {:.2}", t.to, t.from, t.amount))
        .collect();
    format!("{AMOUNTS_DONE}\nPayment plan:\n{}", lines.join("\n"))
}
