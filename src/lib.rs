//! Lanche Payments — Shared Library
//!
//! This crate contains the simulated payment gateway used by the Lanche
//! snack-ordering app: PIX and credit-card mock flows, deferred PIX
//! confirmations, and webhook signature checks.
//!
//! Each serverless function in `api/` imports from this library
//! to keep handlers thin and logic reusable.

pub mod api;
pub mod data;
pub mod error;
pub mod ledger;
pub mod models;
pub mod scheduler;
pub mod simulator;
pub mod webhook;

pub use error::{PaymentError, Result};
pub use simulator::PaymentSimulator;

use tracing_subscriber::EnvFilter;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Install the global tracing subscriber. Honors `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
