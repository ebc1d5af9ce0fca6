/// Card authorization rules for the credit-card mock.
///
/// The outcome is decided purely by the card number prefix, mirroring the
/// well-known test cards of real gateways:
/// - **4111 / 5555**: approved.
/// - **4000**: declined.
/// - Anything else stays pending.
use crate::models::payment::PaymentStatus;

/// Shown in place of the last four digits when fewer than four were given.
pub const MASKED_LAST_FOUR: &str = "****";

/// Prefixes that authorize immediately.
const APPROVED_PREFIXES: [&str; 2] = ["4111", "5555"];

/// Prefixes that are refused by the issuer.
const DECLINED_PREFIXES: [&str; 1] = ["4000"];

/// The authorization decision for one card number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDecision {
    pub status: PaymentStatus,
    pub message: &'static str,
}

/// Strip every whitespace character from a card number as typed.
pub fn normalize_number(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Decide the status of a normalized card number.
pub fn decide(normalized: &str) -> CardDecision {
    if APPROVED_PREFIXES.iter().any(|p| normalized.starts_with(p)) {
        CardDecision {
            status: PaymentStatus::Approved,
            message: "payment approved",
        }
    } else if DECLINED_PREFIXES.iter().any(|p| normalized.starts_with(p)) {
        CardDecision {
            status: PaymentStatus::Declined,
            message: "card declined",
        }
    } else {
        CardDecision {
            status: PaymentStatus::Pending,
            message: "processing payment",
        }
    }
}

/// Last four characters of a normalized number, or [`MASKED_LAST_FOUR`].
pub fn last_four(normalized: &str) -> String {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() < 4 {
        return MASKED_LAST_FOUR.to_string();
    }
    chars[chars.len() - 4..].iter().collect()
}
