//! In-memory payment ledger.
//!
//! The simulator hands every record back to its caller; this is the
//! caller-side store that keeps them, applies verified webhook events, and
//! answers status lookups from real records instead of id heuristics.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{info, warn};

use crate::error::{PaymentError, Result};
use crate::models::payment::{PaymentRecord, PaymentStatus, StatusRecord, WebhookEvent};
use crate::simulator::PaymentSimulator;

#[derive(Debug, Clone)]
struct Entry {
    record: PaymentRecord,
    status: StatusRecord,
}

/// Payment records keyed by transaction id.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    entries: RwLock<HashMap<String, Entry>>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly issued record. Ids are never reissued, so a second
    /// insert for the same id is ignored and returns false.
    pub fn insert(&self, record: PaymentRecord) -> bool {
        let mut entries = self.write();
        if entries.contains_key(&record.payment_id) {
            warn!(payment_id = %record.payment_id, "payment already recorded");
            return false;
        }
        // Cards are decided at creation, so their outcome time is the
        // creation time.
        let status = StatusRecord {
            payment_id: record.payment_id.clone(),
            status: record.status,
            paid_at: (record.status == PaymentStatus::Approved).then_some(record.created_at),
            declined_at: (record.status == PaymentStatus::Declined).then_some(record.created_at),
        };
        entries.insert(record.payment_id.clone(), Entry { record, status });
        true
    }

    pub fn get(&self, payment_id: &str) -> Option<PaymentRecord> {
        self.read().get(payment_id).map(|e| e.record.clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All records, oldest first.
    pub fn records(&self) -> Vec<PaymentRecord> {
        let mut records: Vec<PaymentRecord> =
            self.read().values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.payment_id.cmp(&b.payment_id))
        });
        records
    }

    /// Apply a webhook event to its stored record.
    ///
    /// The caller is expected to have checked the signature. Unknown ids
    /// and backward transitions are rejected and leave the ledger unchanged.
    pub fn apply_event(&self, event: &WebhookEvent) -> Result<PaymentRecord> {
        let mut entries = self.write();
        let entry = entries
            .get_mut(&event.payment_id)
            .ok_or_else(|| PaymentError::UnknownPayment(event.payment_id.clone()))?;

        if let Err(e) = entry.record.transition(event.status) {
            warn!(payment_id = %event.payment_id, error = %e, "ignored webhook event");
            return Err(e);
        }

        entry.status.status = event.status;
        match event.status {
            PaymentStatus::Approved => entry.status.paid_at = Some(event.paid_at),
            PaymentStatus::Declined => entry.status.declined_at = Some(event.paid_at),
            PaymentStatus::Pending => {}
        }

        info!(payment_id = %event.payment_id, status = %event.status, "applied webhook event");
        Ok(entry.record.clone())
    }

    /// Status of a stored payment, if known.
    pub fn status(&self, payment_id: &str) -> Option<StatusRecord> {
        self.read().get(payment_id).map(|e| e.status.clone())
    }

    /// Status from the stored record, or the simulator's id-based answer
    /// for payments this ledger never saw.
    pub fn status_or_simulated(
        &self,
        payment_id: &str,
        simulator: &PaymentSimulator,
    ) -> StatusRecord {
        self.status(payment_id)
            .unwrap_or_else(|| simulator.get_payment_status(payment_id))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Entry>> {
        // A poisoned lock only means a writer panicked mid-insert; the map
        // itself is still consistent.
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
