use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// Payment rails accepted at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    CreditCard,
}

impl PaymentMethod {
    /// Prefix carried by every transaction id issued for this method.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::CreditCard => "cc",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Pix => write!(f, "pix"),
            PaymentMethod::CreditCard => write!(f, "credit_card"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pix" => Ok(PaymentMethod::Pix),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            other => Err(PaymentError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Lifecycle status of a payment.
///
/// Transitions only move forward: `Pending` may become `Approved` or
/// `Declined`, and both of those are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Declined,
}

impl PaymentStatus {
    /// Returns true once no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Approved | PaymentStatus::Declined)
    }

    /// Returns true if moving from `self` to `next` is a valid transition.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Approved)
                | (PaymentStatus::Pending, PaymentStatus::Declined)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Approved => write!(f, "approved"),
            PaymentStatus::Declined => write!(f, "declined"),
        }
    }
}

/// Settlement currency. Lanche only sells in Brazil.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[default]
    BRL,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::BRL => write!(f, "BRL"),
        }
    }
}

/// The record issued for every payment intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentRecord {
    /// Transaction identifier, `pix_…` or `cc_…`. Never reissued.
    pub payment_id: String,
    /// Current lifecycle status.
    pub status: PaymentStatus,
    /// Rail the payment was created on.
    pub payment_method: PaymentMethod,
    /// Amount in BRL, two decimal places.
    pub amount: Decimal,
    /// Always BRL.
    pub currency: Currency,
    /// Order this payment settles.
    pub order_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// PIX only: when the QR code stops being payable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Credit card only: last four digits, or `****` when too short.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last_four: Option<String>,
}

impl PaymentRecord {
    /// Move the record to `next`, rejecting anything but a forward transition.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PaymentError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Result of creating a PIX charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixPayment {
    #[serde(flatten)]
    pub record: PaymentRecord,
    /// Copy-and-paste PIX payload embedding the id and amount.
    pub qr_code: String,
    /// Placeholder QR image as a data URI.
    pub qr_code_image: String,
    /// Human-readable payment instructions.
    pub instructions: String,
}

/// Result of a credit-card authorization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardPayment {
    #[serde(flatten)]
    pub record: PaymentRecord,
    /// Outcome message shown to the customer.
    pub message: String,
}

/// Either creation result, as returned by `PaymentSimulator::create_payment`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PaymentResponse {
    Pix(PixPayment),
    CreditCard(CardPayment),
}

impl PaymentResponse {
    pub fn record(&self) -> &PaymentRecord {
        match self {
            PaymentResponse::Pix(p) => &p.record,
            PaymentResponse::CreditCard(c) => &c.record,
        }
    }
}

/// Answer to a status lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusRecord {
    pub payment_id: String,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declined_at: Option<DateTime<Utc>>,
}

/// Gateway notification announcing a status change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookEvent {
    pub payment_id: String,
    pub status: PaymentStatus,
    /// Same value as `payment_id` in the simulation.
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
    /// Zero unless the scheduler was given the real amount.
    pub amount: Decimal,
    #[serde(default)]
    pub signature: String,
}

impl WebhookEvent {
    /// The bytes a signature is computed over: the event JSON with an
    /// empty signature field.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        let unsigned = WebhookEvent {
            signature: String::new(),
            ..self.clone()
        };
        Ok(serde_json::to_vec(&unsigned)?)
    }
}
