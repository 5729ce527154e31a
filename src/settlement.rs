//! Debt netting for a completed settlement round
//!
//! Turns the amount each participant spent into the smallest list of
//! transfers that brings everybody to the group average.

/// Differences at or below this magnitude count as settled.
pub const SETTLED_EPSILON: f64 = 1e-9;

/// A single transfer produced by [`settle`]
///
/// `from` spent more than the average and is owed money, `to` spent less and
/// owes it. The rendered instruction therefore reads "`to` should send `from`".
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

/// Participant with an outstanding difference from the average
struct Balance<'a> {
    name: &'a str,
    remaining: f64,
}

/// Compute the transfers that settle `amounts`.
///
/// Debtors and creditors are paired greedily in entry order, so the same input
/// always yields the same transactions. At most `amounts.len() - 1` transfers
/// are returned and participants already at the average never appear.
pub fn settle(amounts: &[(String, f64)]) -> Vec<Transaction> {
    if amounts.is_empty() {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)] // participant counts are tiny
    let count = amounts.len() as f64;
    let total: f64 = amounts.iter().map(|(_, spent)| spent).sum();
    // Near f64::MAX the plain sum overflows; averaging per entry stays finite
    let average = if total.is_finite() {
        total / count
    } else {
        amounts.iter().map(|(_, spent)| spent / count).sum::<f64>()
    };

    let mut debtors = Vec::new();
    let mut creditors = Vec::new();
    for (name, spent) in amounts {
        let difference = average - spent;
        if difference > SETTLED_EPSILON {
            debtors.push(Balance {
                name: name.as_str(),
                remaining: difference,
            });
        } else if difference < -SETTLED_EPSILON {
            creditors.push(Balance {
                name: name.as_str(),
                remaining: -difference,
            });
        }
    }

    let mut transactions = Vec::new();
    let (mut d, mut c) = (0, 0);
    while d < debtors.len() && c < creditors.len() {
        let debtor = &mut debtors[d];
        let creditor = &mut creditors[c];

        let amount = debtor.remaining.min(creditor.remaining);
        transactions.push(Transaction {
            from: creditor.name.to_string(),
            to: debtor.name.to_string(),
            amount,
        });

        debtor.remaining -= amount;
        creditor.remaining -= amount;

        if debtor.remaining <= SETTLED_EPSILON {
            d += 1;
        }
        if creditor.remaining <= SETTLED_EPSILON {
            c += 1;
        }
    }

    tracing::debug!(
        participants = amounts.len(),
        average,
        transfers = transactions.len(),
        "Settlement computed"
    );

    transactions
}
