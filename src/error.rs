//! Error type shared by the simulator, the ledger, and the handlers.

use thiserror::Error;

use crate::models::payment::PaymentStatus;

/// Errors surfaced while turning caller input into payment records.
///
/// Status decisions, scheduling, and signature checks never fail; these
/// variants only cover malformed intents, ledger bookkeeping, and config.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("unsupported payment method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("unknown payment: {0}")]
    UnknownPayment(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
