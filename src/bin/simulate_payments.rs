//! CLI tool to run the demo checkout through the payment simulator.
//!
//! Every PIX charge is confirmed immediately (zero delay) and the resulting
//! webhook events are verified and applied to an in-memory ledger.
//!
//! Produces:
//! - `output/payments.json` — final state of every payment

use std::time::Duration;

use lanche_payments::data::generate_intents;
use lanche_payments::ledger::PaymentLedger;
use lanche_payments::models::payment::{PaymentMethod, PaymentResponse, PaymentStatus};
use lanche_payments::simulator::config::SimulatorConfig;
use lanche_payments::PaymentSimulator;
use tracing::warn;

const DEMO_ORDERS: usize = 40;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lanche_payments::init_tracing();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let simulator = PaymentSimulator::new(SimulatorConfig::from_env()?)?.with_event_sink(tx);
    let ledger = PaymentLedger::new();

    // Create every payment and schedule PIX confirmations
    let mut handles = Vec::new();
    for intent in generate_intents(DEMO_ORDERS) {
        let response = simulator.create_payment(&intent)?;
        if let PaymentResponse::Pix(pix) = &response {
            handles.push(simulator.schedule_confirmation_for(
                &pix.record.payment_id,
                pix.record.amount,
                Duration::ZERO,
            ));
        }
        ledger.insert(response.record().clone());
    }

    // Drop our sender so the channel closes once every task has fired
    drop(simulator);
    for handle in handles {
        handle.wait().await;
    }

    let verifier = PaymentSimulator::new(SimulatorConfig::from_env()?)?;
    while let Some(event) = rx.recv().await {
        let payload = event.signing_payload()?;
        if !verifier.validate_webhook_signature(&payload, &event.signature) {
            warn!(payment_id = %event.payment_id, "dropping event with bad signature");
            continue;
        }
        if let Err(e) = ledger.apply_event(&event) {
            warn!(payment_id = %event.payment_id, error = %e, "could not apply event");
        }
    }

    let records = ledger.records();
    std::fs::create_dir_all("output")?;
    std::fs::write("output/payments.json", serde_json::to_string_pretty(&records)?)?;
    println!("Wrote output/payments.json ({} payments)", records.len());

    // Print summary
    let count = |method: PaymentMethod, status: PaymentStatus| {
        records
            .iter()
            .filter(|r| r.payment_method == method && r.status == status)
            .count()
    };
    println!();
    println!("=== PAYMENT SIMULATION SUMMARY ===");
    for method in [PaymentMethod::Pix, PaymentMethod::CreditCard] {
        println!("--- {} ---", method);
        for status in [PaymentStatus::Approved, PaymentStatus::Declined, PaymentStatus::Pending] {
            println!("  {:<10} {}", status.to_string(), count(method, status));
        }
    }
    let approved_total: rust_decimal::Decimal = records
        .iter()
        .filter(|r| r.status == PaymentStatus::Approved)
        .map(|r| r.amount)
        .sum();
    println!();
    println!("Approved volume: R$ {}", lanche_payments::simulator::format_amount(approved_total));

    Ok(())
}
