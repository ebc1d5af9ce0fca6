//! Deferred PIX confirmations.
//!
//! A real PIX charge is settled when the payer's bank completes the
//! transfer, some seconds after the QR code is shown. The sandbox fakes this
//! with one detached task per payment that sleeps, then builds the
//! `approved` webhook event. Delivering that event is the receiver's job:
//! the task only hands it to the optional sink and to whoever waits on the
//! [`ConfirmationHandle`].
//!
//! Inside a tokio runtime the task is a tokio task. Synchronous callers get
//! a plain OS thread instead, so scheduling works from anywhere.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::models::payment::{PaymentStatus, WebhookEvent};
use crate::simulator::clock::Clock;
use crate::webhook::SignatureVerifier;

/// Everything the background task needs, cloned out of the simulator.
pub(crate) struct ConfirmationJob {
    pub payment_id: String,
    pub amount: Decimal,
    pub delay: Duration,
    pub clock: Arc<dyn Clock>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub sink: Option<UnboundedSender<WebhookEvent>>,
}

/// Flags shared between a handle and its task.
#[derive(Debug, Default)]
struct TaskState {
    cancelled: AtomicBool,
    finished: AtomicBool,
}

/// Handle to a scheduled confirmation.
///
/// Dropping the handle does not cancel the task; the confirmation still
/// fires and reaches the sink.
#[derive(Debug)]
pub struct ConfirmationHandle {
    payment_id: String,
    state: Arc<TaskState>,
    event: oneshot::Receiver<WebhookEvent>,
    /// Set when the task runs on a tokio runtime.
    abort: Option<AbortHandle>,
}

impl ConfirmationHandle {
    /// Scheduling never fails, so this is always true.
    pub fn accepted(&self) -> bool {
        true
    }

    pub fn payment_id(&self) -> &str {
        &self.payment_id
    }

    /// Returns true once the event has been produced or the task cancelled.
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::SeqCst)
    }

    /// Stop the confirmation if it has not fired yet.
    pub fn cancel(&self) {
        debug!(payment_id = %self.payment_id, "cancelling PIX confirmation");
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.finished.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Wait for the event. `None` if the confirmation was cancelled.
    pub async fn wait(self) -> Option<WebhookEvent> {
        if self.state.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        self.event.await.ok()
    }

    /// Blocking form of [`ConfirmationHandle::wait`] for callers outside a
    /// tokio runtime. Must not be called from async code.
    pub fn wait_blocking(self) -> Option<WebhookEvent> {
        if self.state.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        self.event.blocking_recv().ok()
    }
}

/// Start the confirmation on the current tokio runtime, or on a detached
/// thread when there is none.
pub(crate) fn spawn_confirmation(job: ConfirmationJob) -> ConfirmationHandle {
    let payment_id = job.payment_id.clone();
    let state = Arc::new(TaskState::default());
    let (tx, rx) = oneshot::channel();

    let abort = match Handle::try_current() {
        Ok(runtime) => {
            info!(
                payment_id = %payment_id,
                delay_secs = job.delay.as_secs_f64(),
                "scheduled PIX confirmation"
            );
            let task_state = Arc::clone(&state);
            let task = runtime.spawn(async move {
                tokio::time::sleep(job.delay).await;
                fire(&job, &task_state, tx);
            });
            Some(task.abort_handle())
        }
        Err(_) => {
            info!(
                payment_id = %payment_id,
                delay_secs = job.delay.as_secs_f64(),
                "scheduled PIX confirmation on a background thread"
            );
            let task_state = Arc::clone(&state);
            std::thread::spawn(move || {
                std::thread::sleep(job.delay);
                fire(&job, &task_state, tx);
            });
            None
        }
    };

    ConfirmationHandle {
        payment_id,
        state,
        event: rx,
        abort,
    }
}

/// Build the event and hand it out, unless the handle cancelled us first.
fn fire(job: &ConfirmationJob, state: &TaskState, tx: oneshot::Sender<WebhookEvent>) {
    if state.cancelled.load(Ordering::SeqCst) {
        return;
    }

    let event = build_event(job);
    info!(payment_id = %event.payment_id, "PIX confirmation fired");

    if let Some(sink) = &job.sink {
        // The receiver may be gone; the event is simply lost then.
        if sink.send(event.clone()).is_err() {
            debug!(payment_id = %event.payment_id, "no receiver for confirmation event");
        }
    }
    // The handle may have been dropped; same as above.
    let _ = tx.send(event);
    state.finished.store(true, Ordering::SeqCst);
}

fn build_event(job: &ConfirmationJob) -> WebhookEvent {
    let mut event = WebhookEvent {
        payment_id: job.payment_id.clone(),
        status: PaymentStatus::Approved,
        transaction_id: job.payment_id.clone(),
        paid_at: job.clock.now(),
        amount: job.amount,
        signature: String::new(),
    };
    match event.signing_payload() {
        Ok(payload) => event.signature = job.verifier.sign(&payload),
        Err(e) => {
            warn!(payment_id = %event.payment_id, error = %e, "could not sign confirmation")
        }
    }
    event
}
