//! Demo data for the payment simulator.
//!
//! Generates checkout intents for Lanche's snack menu using the gateway
//! test cards. Uses seeded RNG so demo runs are reproducible.
//!
//! # Data Distribution
//! - ~40% PIX, ~60% credit card
//! - Cards drawn from the four sandbox test cards (approve / decline / pending)
//! - Orders of 1–4 snacks priced R$4.50–R$28.00

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde_json::json;

use crate::models::intent::{CardData, CustomerInfo, PaymentIntent};
use crate::models::payment::PaymentMethod;

/// Sandbox test cards and the status each one produces.
pub const TEST_CARDS: [(&str, &str); 4] = [
    ("4111 1111 1111 1111", "approved"),
    ("5555 5555 5555 4444", "approved"),
    ("4000 0000 0000 0002", "declined"),
    ("9999 9999 9999 9999", "pending"),
];

/// Snack menu prices in cents.
const MENU_PRICES_CENTS: [i64; 6] = [450, 890, 1290, 1650, 2200, 2800];

const CUSTOMER_NAMES: [&str; 5] = ["Ana", "Bruno", "Carla", "Diego", "Elisa"];

/// Data seed for reproducible generation.
const DATA_SEED: u64 = 42;

/// Generate `count` checkout intents with a realistic method mix.
pub fn generate_intents(count: usize) -> Vec<PaymentIntent> {
    let mut rng = StdRng::seed_from_u64(DATA_SEED);
    let mut intents = Vec::with_capacity(count);

    for i in 0..count {
        let method = if rng.gen_bool(0.4) {
            PaymentMethod::Pix
        } else {
            PaymentMethod::CreditCard
        };

        let items = rng.gen_range(1..=4);
        let total_cents: i64 = (0..items)
            .map(|_| MENU_PRICES_CENTS[rng.gen_range(0..MENU_PRICES_CENTS.len())])
            .sum();

        let name = CUSTOMER_NAMES[rng.gen_range(0..CUSTOMER_NAMES.len())];
        let card = match method {
            PaymentMethod::CreditCard => {
                let (number, _) = TEST_CARDS[rng.gen_range(0..TEST_CARDS.len())];
                Some(CardData {
                    number: number.to_string(),
                    holder_name: Some(name.to_uppercase()),
                    ..Default::default()
                })
            }
            PaymentMethod::Pix => None,
        };

        intents.push(PaymentIntent {
            method,
            amount: Decimal::new(total_cents, 2),
            order_id: format!("order_{:04}", i + 1),
            customer: CustomerInfo(json!({
                "name": name,
                "email": format!("{}@lanche.app", name.to_lowercase()),
            })),
            card,
        });
    }

    intents
}
