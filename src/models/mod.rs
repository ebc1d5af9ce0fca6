//! Domain models for the payment simulator.
//!
//! These types are shared across all modules: simulator, scheduler, ledger, and the API handlers.

pub mod intent;
pub mod payment;
