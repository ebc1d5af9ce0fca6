//! Payment Simulator — sandbox stand-in for a Brazilian payment gateway.
//!
//! Issues PIX charges and credit-card authorizations without touching a
//! real network. Card outcomes follow the test-card prefix rules in
//! [`card`]; PIX charges start pending and are approved later by a
//! deferred confirmation. The simulator keeps no state between calls:
//! every record is handed back to the caller, who owns persistence.

pub mod card;
pub mod clock;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use self::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use self::config::SimulatorConfig;
use crate::error::{PaymentError, Result};
use crate::models::intent::{CardData, CustomerInfo, PaymentIntent};
use crate::models::payment::{
    CardPayment, Currency, PaymentMethod, PaymentRecord, PaymentResponse, PaymentStatus,
    PixPayment, StatusRecord, WebhookEvent,
};
use crate::scheduler::{spawn_confirmation, ConfirmationHandle, ConfirmationJob};
use crate::webhook::{verifier_for, SentinelVerifier, SignatureVerifier};

/// 1x1 transparent PNG shown in place of a rendered QR code.
pub const PLACEHOLDER_QR_IMAGE: &str =
    "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const PIX_INSTRUCTIONS: &str =
    "Scan the QR code with your banking app or copy and paste the PIX code";

/// Simulated payment gateway.
///
/// Construct one per application with [`PaymentSimulator::new`] and share
/// it by reference; nothing inside is mutable.
pub struct PaymentSimulator {
    config: SimulatorConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    verifier: Arc<dyn SignatureVerifier>,
    events: Option<UnboundedSender<WebhookEvent>>,
}

impl PaymentSimulator {
    /// Creates a simulator using the system clock and UUID-based ids.
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        let verifier = verifier_for(&config)?;
        Ok(PaymentSimulator {
            config,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            verifier,
            events: None,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Every confirmation event is also sent to `sink` when it fires.
    pub fn with_event_sink(mut self, sink: UnboundedSender<WebhookEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Create a payment from a validated intent, dispatching on its method.
    pub fn create_payment(&self, intent: &PaymentIntent) -> Result<PaymentResponse> {
        match intent.method {
            PaymentMethod::Pix => Ok(PaymentResponse::Pix(self.create_pix_payment(
                intent.amount,
                &intent.order_id,
                &intent.customer,
            ))),
            PaymentMethod::CreditCard => {
                let card = intent
                    .card
                    .as_ref()
                    .ok_or_else(|| PaymentError::MissingField("card".to_string()))?;
                Ok(PaymentResponse::CreditCard(self.create_credit_card_payment(
                    intent.amount,
                    &intent.order_id,
                    &intent.customer,
                    card,
                )))
            }
        }
    }

    /// Issue a PIX charge. Always pending; payable for the configured
    /// expiry window (30 minutes by default).
    #[instrument(skip(self, _customer), fields(method = "pix"))]
    pub fn create_pix_payment(
        &self,
        amount: Decimal,
        order_id: &str,
        _customer: &CustomerInfo,
    ) -> PixPayment {
        let payment_id = self.ids.next_id(PaymentMethod::Pix);
        let created_at = self.clock.now();
        let expires_at = created_at + ChronoDuration::minutes(self.config.pix_expiry_minutes);

        let qr_code = self.pix_payload(&payment_id, amount);

        info!(payment_id = %payment_id, status = %PaymentStatus::Pending, "created PIX payment");

        PixPayment {
            record: PaymentRecord {
                payment_id,
                status: PaymentStatus::Pending,
                payment_method: PaymentMethod::Pix,
                amount,
                currency: Currency::BRL,
                order_id: order_id.to_string(),
                created_at,
                expires_at: Some(expires_at),
                card_last_four: None,
            },
            qr_code,
            qr_code_image: PLACEHOLDER_QR_IMAGE.to_string(),
            instructions: PIX_INSTRUCTIONS.to_string(),
        }
    }

    /// Authorize a credit card. The outcome is decided on the spot by the
    /// card number prefix and never changes afterwards.
    #[instrument(skip(self, _customer, card), fields(method = "credit_card"))]
    pub fn create_credit_card_payment(
        &self,
        amount: Decimal,
        order_id: &str,
        _customer: &CustomerInfo,
        card: &CardData,
    ) -> CardPayment {
        let payment_id = self.ids.next_id(PaymentMethod::CreditCard);
        let number = card::normalize_number(&card.number);
        let decision = card::decide(&number);
        let last_four = card::last_four(&number);

        debug!(
            payment_id = %payment_id,
            card_last_four = %last_four,
            "card decision: {}",
            decision.message
        );
        info!(payment_id = %payment_id, status = %decision.status, "created credit card payment");

        CardPayment {
            record: PaymentRecord {
                payment_id,
                status: decision.status,
                payment_method: PaymentMethod::CreditCard,
                amount,
                currency: Currency::BRL,
                order_id: order_id.to_string(),
                created_at: self.clock.now(),
                expires_at: None,
                card_last_four: Some(last_four),
            },
            message: decision.message.to_string(),
        }
    }

    /// Schedule the PIX confirmation after the configured default delay.
    pub fn schedule_default_confirmation(&self, payment_id: &str) -> ConfirmationHandle {
        self.schedule_confirmation(payment_id, self.config.confirmation_delay)
    }

    /// Arrange for an `approved` webhook event for `payment_id` to be
    /// produced after `delay`. Returns at once.
    ///
    /// Runs on the current tokio runtime when there is one, otherwise on a
    /// background thread. The event's amount is zero; use
    /// [`PaymentSimulator::schedule_confirmation_for`] to carry the real
    /// amount.
    pub fn schedule_confirmation(&self, payment_id: &str, delay: Duration) -> ConfirmationHandle {
        self.schedule_confirmation_for(payment_id, Decimal::ZERO, delay)
    }

    /// Like [`PaymentSimulator::schedule_confirmation`], with the amount
    /// the event should report.
    pub fn schedule_confirmation_for(
        &self,
        payment_id: &str,
        amount: Decimal,
        delay: Duration,
    ) -> ConfirmationHandle {
        spawn_confirmation(ConfirmationJob {
            payment_id: payment_id.to_string(),
            amount,
            delay,
            clock: Arc::clone(&self.clock),
            verifier: Arc::clone(&self.verifier),
            sink: self.events.clone(),
        })
    }

    /// Check a webhook signature with the configured strategy.
    pub fn validate_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let valid = self.verifier.verify(payload, signature);
        if !valid {
            warn!("rejected webhook signature");
        }
        valid
    }

    /// Sandbox status lookup.
    ///
    /// The simulator keeps no records, so the status is read from the id
    /// itself: ids containing `approved` or `declined` report that status,
    /// everything else is pending. Use a
    /// [`PaymentLedger`](crate::ledger::PaymentLedger) for lookups backed by
    /// issued records.
    pub fn get_payment_status(&self, payment_id: &str) -> StatusRecord {
        let now = self.clock.now();
        if payment_id.contains("approved") {
            StatusRecord {
                payment_id: payment_id.to_string(),
                status: PaymentStatus::Approved,
                paid_at: Some(now),
                declined_at: None,
            }
        } else if payment_id.contains("declined") {
            StatusRecord {
                payment_id: payment_id.to_string(),
                status: PaymentStatus::Declined,
                paid_at: None,
                declined_at: Some(now),
            }
        } else {
            StatusRecord {
                payment_id: payment_id.to_string(),
                status: PaymentStatus::Pending,
                paid_at: None,
                declined_at: None,
            }
        }
    }

    /// Copy-and-paste PIX payload. Shaped like a BR Code but not a valid
    /// one: the CRC is a fixed placeholder.
    fn pix_payload(&self, payment_id: &str, amount: Decimal) -> String {
        format!(
            concat!(
                "00020126580014BR.GOV.BCB.PIX0136{payment_id}",
                "520400005303986540{amount}5802BR",
                "5913{name}6009{city}62070503***6304ABCD",
            ),
            payment_id = payment_id,
            amount = format_amount(amount),
            name = self.config.merchant_name,
            city = self.config.merchant_city,
        )
    }
}

impl Default for PaymentSimulator {
    /// Sandbox defaults with the sentinel signature strategy.
    fn default() -> Self {
        PaymentSimulator {
            config: SimulatorConfig::default(),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            verifier: Arc::new(SentinelVerifier),
            events: None,
        }
    }
}

/// Two-decimal fixed point, rounding half away from zero, e.g. `25.5` ->
/// `"25.50"` and `1.999` -> `"2.00"`.
pub fn format_amount(amount: Decimal) -> String {
    let cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct SequentialIds(AtomicUsize);

    impl IdGenerator for SequentialIds {
        fn next_id(&self, method: PaymentMethod) -> String {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            format!("{}_{:016}", method.id_prefix(), n)
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn simulator() -> PaymentSimulator {
        PaymentSimulator::new(SimulatorConfig::default())
            .unwrap()
            .with_clock(Arc::new(FixedClock(fixed_time())))
    }

    fn card_payment(number: &str) -> CardPayment {
        simulator().create_credit_card_payment(
            Decimal::new(1500, 2),
            "order_1",
            &CustomerInfo::default(),
            &CardData::with_number(number),
        )
    }

    #[test]
    fn test_pix_payment_is_pending_and_expires_in_thirty_minutes() {
        let pix = simulator().create_pix_payment(
            Decimal::new(2550, 2),
            "order_9",
            &CustomerInfo::default(),
        );

        assert_eq!(pix.record.status, PaymentStatus::Pending);
        assert_eq!(pix.record.payment_method, PaymentMethod::Pix);
        assert_eq!(pix.record.currency, Currency::BRL);
        assert_eq!(pix.record.created_at, fixed_time());
        assert_eq!(
            pix.record.expires_at,
            Some(fixed_time() + ChronoDuration::minutes(30))
        );
        assert!(pix.record.payment_id.starts_with("pix_"));
        assert!(pix.record.card_last_four.is_none());
        assert_eq!(pix.qr_code_image, PLACEHOLDER_QR_IMAGE);
        assert!(!pix.instructions.is_empty());
    }

    #[test]
    fn test_pix_payload_embeds_id_and_amount() {
        let pix = simulator().create_pix_payment(
            Decimal::new(255, 1),
            "order_9",
            &CustomerInfo::default(),
        );

        assert!(pix.qr_code.contains(&pix.record.payment_id));
        assert!(pix.qr_code.contains("25.50"));
        assert!(pix.qr_code.starts_with("00020126580014BR.GOV.BCB.PIX"));
        assert!(pix.qr_code.contains("LANCHE APP"));
    }

    #[test]
    fn test_format_amount_is_two_decimals() {
        assert_eq!(format_amount(Decimal::new(255, 1)), "25.50");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(Decimal::new(7, 0)), "7.00");
        assert_eq!(format_amount(Decimal::new(1999, 2)), "19.99");
        assert_eq!(format_amount(Decimal::new(1999, 3)), "2.00");
        assert_eq!(format_amount(Decimal::new(10005, 3)), "10.01");
        assert_eq!(format_amount(Decimal::new(10004, 3)), "10.00");
    }

    #[test]
    fn test_credit_card_test_cards() {
        let cases = [
            ("4111111111111111", PaymentStatus::Approved, "1111", "payment approved"),
            ("4000000000000000", PaymentStatus::Declined, "0000", "card declined"),
            ("9999999999999999", PaymentStatus::Pending, "9999", "processing payment"),
            ("5555 5555 5555 4444", PaymentStatus::Approved, "4444", "payment approved"),
        ];

        for (number, status, last_four, message) in cases {
            let payment = card_payment(number);
            assert_eq!(payment.record.status, status, "card {number}");
            assert_eq!(payment.record.card_last_four.as_deref(), Some(last_four));
            assert_eq!(payment.message, message);
            assert!(payment.record.payment_id.starts_with("cc_"));
            assert_eq!(payment.record.currency, Currency::BRL);
            assert!(payment.record.expires_at.is_none());
        }
    }

    #[test]
    fn test_empty_card_number_is_masked() {
        let payment = card_payment("");
        assert_eq!(payment.record.card_last_four.as_deref(), Some("****"));
        assert_eq!(payment.record.status, PaymentStatus::Pending);

        let short = card_payment(" 12 ");
        assert_eq!(short.record.card_last_four.as_deref(), Some("****"));
    }

    #[test]
    fn test_ids_are_distinct_across_calls() {
        let sim = simulator();
        let mut ids = HashSet::new();
        for _ in 0..200 {
            let pix = sim.create_pix_payment(Decimal::ONE, "o", &CustomerInfo::default());
            assert!(pix.record.payment_id.starts_with("pix_"));
            ids.insert(pix.record.payment_id);

            let cc = sim.create_credit_card_payment(
                Decimal::ONE,
                "o",
                &CustomerInfo::default(),
                &CardData::with_number("4111111111111111"),
            );
            assert!(cc.record.payment_id.starts_with("cc_"));
            ids.insert(cc.record.payment_id);
        }
        assert_eq!(ids.len(), 400);
    }

    #[test]
    fn test_injected_id_generator_is_used() {
        let sim = simulator().with_id_generator(Arc::new(SequentialIds(AtomicUsize::new(7))));
        let pix = sim.create_pix_payment(Decimal::ONE, "o", &CustomerInfo::default());
        assert_eq!(pix.record.payment_id, "pix_0000000000000007");
    }

    #[test]
    fn test_create_payment_dispatches_on_method() {
        let sim = simulator();
        let intent = PaymentIntent {
            method: PaymentMethod::CreditCard,
            amount: Decimal::new(990, 2),
            order_id: "12".to_string(),
            customer: CustomerInfo::default(),
            card: Some(CardData::with_number("4000 0000 0000 0002")),
        };
        let response = sim.create_payment(&intent).unwrap();
        assert!(matches!(response, PaymentResponse::CreditCard(_)));
        assert_eq!(response.record().status, PaymentStatus::Declined);
        assert_eq!(response.record().order_id, "12");

        let missing_card = PaymentIntent { card: None, ..intent };
        assert!(matches!(
            sim.create_payment(&missing_card),
            Err(PaymentError::MissingField(f)) if f == "card"
        ));
    }

    #[test]
    fn test_webhook_signature_sentinel() {
        let sim = simulator();
        assert!(sim.validate_webhook_signature(b"{}", "simulated_signature"));
        assert!(sim.validate_webhook_signature(b"anything at all", "simulated_signature"));
        assert!(!sim.validate_webhook_signature(b"{}", "forged"));
        assert!(!sim.validate_webhook_signature(b"{}", ""));
    }

    #[test]
    fn test_status_lookup_reads_the_id() {
        let sim = simulator();

        let approved = sim.get_payment_status("pix_approved_1");
        assert_eq!(approved.status, PaymentStatus::Approved);
        assert_eq!(approved.paid_at, Some(fixed_time()));
        assert!(approved.declined_at.is_none());

        let declined = sim.get_payment_status("cc_declined_1");
        assert_eq!(declined.status, PaymentStatus::Declined);
        assert_eq!(declined.declined_at, Some(fixed_time()));

        let pending = sim.get_payment_status("pix_0123456789abcdef");
        assert_eq!(pending.status, PaymentStatus::Pending);
        assert!(pending.paid_at.is_none() && pending.declined_at.is_none());
    }

    #[test]
    fn test_created_records_survive_serialization() {
        let sim = simulator();
        let pix = sim.create_pix_payment(Decimal::new(1234, 2), "o1", &CustomerInfo::default());
        let json = serde_json::to_string(&pix).unwrap();
        assert_eq!(serde_json::from_str::<PixPayment>(&json).unwrap(), pix);

        let cc = card_payment("4111111111111111");
        let json = serde_json::to_string(&cc).unwrap();
        assert_eq!(serde_json::from_str::<CardPayment>(&json).unwrap(), cc);
    }

    #[test]
    fn test_confirmation_from_synchronous_caller() {
        let sim = simulator();
        let handle = sim.schedule_confirmation("pix_sync", Duration::ZERO);
        assert!(handle.accepted());

        let event = handle.wait_blocking().expect("confirmation was cancelled");
        assert_eq!(event.payment_id, "pix_sync");
        assert_eq!(event.status, PaymentStatus::Approved);
        assert_eq!(event.paid_at, fixed_time());
    }

    #[test]
    fn test_pix_payload_rounds_unrounded_amounts() {
        let pix = simulator().create_pix_payment(
            Decimal::new(1999, 3),
            "order_9",
            &CustomerInfo::default(),
        );
        assert!(pix.qr_code.contains("5402.00"));
    }

    #[tokio::test]
    async fn test_zero_delay_confirmation_approves() {
        let sim = simulator();
        let handle = sim.schedule_confirmation("pix_abc", Duration::ZERO);
        assert!(handle.accepted());
        assert_eq!(handle.payment_id(), "pix_abc");

        let event = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .expect("confirmation did not fire in time")
            .expect("confirmation was cancelled");

        assert_eq!(event.payment_id, "pix_abc");
        assert_eq!(event.transaction_id, "pix_abc");
        assert_eq!(event.status, PaymentStatus::Approved);
        assert_eq!(event.amount, Decimal::ZERO);
        assert_eq!(event.signature, "simulated_signature");
        assert_eq!(event.paid_at, fixed_time());
    }

    #[tokio::test]
    async fn test_scheduling_does_not_block_the_caller() {
        let sim = simulator();
        let started = std::time::Instant::now();
        let handle = sim.schedule_confirmation("pix_slow", Duration::from_secs(3600));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!handle.is_finished());
        handle.cancel();
        assert_eq!(handle.wait().await, None);
    }

    #[tokio::test]
    async fn test_confirmation_reaches_event_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sim = simulator().with_event_sink(tx);

        let _handle =
            sim.schedule_confirmation_for("pix_sink", Decimal::new(4200, 2), Duration::ZERO);

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no event before timeout")
            .expect("sink closed");
        assert_eq!(event.payment_id, "pix_sink");
        assert_eq!(event.amount, Decimal::new(4200, 2));
        let payload = event.signing_payload().unwrap();
        assert!(sim.validate_webhook_signature(&payload, &event.signature));
    }
}
