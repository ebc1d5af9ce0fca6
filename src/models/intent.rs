use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payment::PaymentMethod;
use crate::error::{PaymentError, Result};

/// Customer details forwarded with an intent. Opaque to the simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct CustomerInfo(pub Value);

/// Card details submitted with a credit-card intent.
///
/// Nothing here is validated; only the last four digits survive into the
/// payment record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CardData {
    /// Card number as typed, spaces allowed. Missing numbers become empty.
    #[serde(default)]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
}

impl CardData {
    pub fn with_number(number: &str) -> Self {
        CardData {
            number: number.to_string(),
            ..Default::default()
        }
    }
}

/// A validated request to start a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub method: PaymentMethod,
    /// Amount in BRL, rounded to two decimal places.
    pub amount: Decimal,
    pub order_id: String,
    pub customer: CustomerInfo,
    /// Present for credit-card intents.
    pub card: Option<CardData>,
}

impl PaymentIntent {
    /// Validate a raw JSON intent as posted by the checkout page.
    ///
    /// Expected shape:
    /// `{"payment_method": "pix"|"credit_card", "amount": 25.5 | "25.50",
    ///   "order_id": "42" | 42, "customer_info": {...}, "card": {"number": "..."}}`
    pub fn from_json(raw: &Value) -> Result<Self> {
        let method = match raw.get("payment_method") {
            Some(Value::String(s)) => PaymentMethod::from_str(s)?,
            Some(Value::Null) | None => {
                return Err(PaymentError::MissingField("payment_method".to_string()))
            }
            Some(other) => return Err(PaymentError::UnsupportedMethod(other.to_string())),
        };

        let amount = match raw.get("amount") {
            Some(Value::Null) | None => {
                return Err(PaymentError::MissingField("amount".to_string()))
            }
            Some(value) => parse_amount(value)?,
        };

        let order_id = match raw.get("order_id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(PaymentError::MissingField("order_id".to_string())),
        };

        let customer = raw
            .get("customer_info")
            .cloned()
            .map(CustomerInfo)
            .unwrap_or_default();

        let card = match (method, raw.get("card").or_else(|| raw.get("card_data"))) {
            (PaymentMethod::CreditCard, Some(Value::Null) | None) => {
                return Err(PaymentError::MissingField("card".to_string()))
            }
            (PaymentMethod::CreditCard, Some(value)) => {
                Some(serde_json::from_value::<CardData>(value.clone())?)
            }
            (PaymentMethod::Pix, _) => None,
        };

        Ok(PaymentIntent {
            method,
            amount,
            order_id,
            customer,
            card,
        })
    }
}

/// Parse a JSON amount (number or numeric string) into BRL with two
/// decimal places. Negative and non-numeric values are rejected.
pub fn parse_amount(value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(PaymentError::InvalidAmount(other.to_string())),
    };

    // Large or exponent-form numbers need the scientific parser.
    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| PaymentError::InvalidAmount(text.clone()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PaymentError::InvalidAmount(text));
    }

    Ok(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_pix_intent() {
        let intent = PaymentIntent::from_json(&json!({
            "payment_method": "pix",
            "amount": 25.5,
            "order_id": 42,
            "customer_info": {"name": "Ana"}
        }))
        .unwrap();

        assert_eq!(intent.method, PaymentMethod::Pix);
        assert_eq!(intent.amount, Decimal::new(2550, 2));
        assert_eq!(intent.order_id, "42");
        assert_eq!(intent.customer.0["name"], "Ana");
        assert!(intent.card.is_none());
    }

    #[test]
    fn test_parses_card_intent_with_string_amount() {
        let intent = PaymentIntent::from_json(&json!({
            "payment_method": "credit_card",
            "amount": "18.90",
            "order_id": "7",
            "card_data": {"number": "4111 1111 1111 1111", "holder_name": "ANA"}
        }))
        .unwrap();

        assert_eq!(intent.amount, Decimal::new(1890, 2));
        let card = intent.card.unwrap();
        assert_eq!(card.number, "4111 1111 1111 1111");
        assert_eq!(card.holder_name.as_deref(), Some("ANA"));
    }

    #[test]
    fn test_non_numeric_amount_is_invalid() {
        for amount in [json!("abc"), json!(true), json!([1]), json!("")] {
            let err = PaymentIntent::from_json(&json!({
                "payment_method": "pix",
                "amount": amount,
                "order_id": "1"
            }))
            .unwrap_err();
            assert!(
                matches!(err, PaymentError::InvalidAmount(_)),
                "amount {amount} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_negative_amount_is_invalid() {
        assert!(matches!(
            parse_amount(&json!(-1.0)),
            Err(PaymentError::InvalidAmount(_))
        ));
        assert_eq!(parse_amount(&json!(0)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_amount_rounds_to_cents() {
        assert_eq!(parse_amount(&json!("10.005")).unwrap(), Decimal::new(1001, 2));
        assert_eq!(parse_amount(&json!(3)).unwrap(), Decimal::new(3, 0));
    }

    #[test]
    fn test_missing_fields_are_named() {
        let cases = [
            (json!({"amount": 1, "order_id": "1"}), "payment_method"),
            (json!({"payment_method": "pix", "order_id": "1"}), "amount"),
            (json!({"payment_method": "pix", "amount": 1}), "order_id"),
            (
                json!({"payment_method": "credit_card", "amount": 1, "order_id": "1"}),
                "card",
            ),
        ];
        for (raw, field) in cases {
            match PaymentIntent::from_json(&raw) {
                Err(PaymentError::MissingField(name)) => assert_eq!(name, field),
                other => panic!("expected MissingField({field}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_card_without_number_is_accepted() {
        let intent = PaymentIntent::from_json(&json!({
            "payment_method": "credit_card",
            "amount": 1,
            "order_id": "1",
            "card": {}
        }))
        .unwrap();
        assert_eq!(intent.card.unwrap().number, "");
    }

    #[test]
    fn test_unknown_method_is_unsupported() {
        let err = PaymentIntent::from_json(&json!({
            "payment_method": "boleto",
            "amount": 1,
            "order_id": "1"
        }))
        .unwrap_err();
        assert!(matches!(err, PaymentError::UnsupportedMethod(_)));
    }
}
