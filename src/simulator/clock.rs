//! Collaborators the simulator borrows from its environment: a clock for
//! timestamps and a generator for transaction ids.

use chrono::{DateTime, Utc};

use crate::models::payment::PaymentMethod;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues collision-free transaction ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, method: PaymentMethod) -> String;
}

/// `pix_` / `cc_` followed by the first 16 hex digits of a v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self, method: PaymentMethod) -> String {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        format!("{}_{}", method.id_prefix(), &hex[..16])
    }
}
