use lanche_payments::api::{
    body_bytes, error_response, json_response, method_not_allowed, payment_error_response,
};
use lanche_payments::models::intent::PaymentIntent;
use lanche_payments::models::payment::PaymentResponse;
use lanche_payments::simulator::config::SimulatorConfig;
use lanche_payments::PaymentSimulator;
use tracing::error;
use vercel_runtime::{run, Body, Error, Request, Response, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Error> {
    lanche_payments::init_tracing();
    run(handler).await
}

/// POST /api/payments — Create a PIX charge or authorize a credit card.
///
/// PIX charges come back pending; their confirmation is scheduled after the
/// configured delay. The confirmation event has no receiver here and is
/// discarded: a serverless instance shares no memory with `/api/webhook` and
/// may be frozen before the delay elapses. Clients learn the outcome from
/// `/api/payment_status` or a real webhook delivery.
pub async fn handler(req: Request) -> Result<Response<Body>, Error> {
    if *req.method() != http::Method::POST {
        return method_not_allowed("Use POST to create a payment");
    }

    let simulator = match SimulatorConfig::from_env().and_then(PaymentSimulator::new) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!(error = %e, "could not configure payment simulator");
            return payment_error_response(&e);
        }
    };

    let raw: serde_json::Value = match serde_json::from_slice(body_bytes(req.body())) {
        Ok(raw) => raw,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "Malformed JSON", &e.to_string())
        }
    };

    let intent = match PaymentIntent::from_json(&raw) {
        Ok(intent) => intent,
        Err(e) => return payment_error_response(&e),
    };

    let response = match simulator.create_payment(&intent) {
        Ok(response) => response,
        Err(e) => return payment_error_response(&e),
    };

    if let PaymentResponse::Pix(pix) = &response {
        // No sink, and the handle is dropped; see above.
        let _ = simulator.schedule_confirmation_for(
            &pix.record.payment_id,
            pix.record.amount,
            simulator.config().confirmation_delay,
        );
    }

    json_response(StatusCode::CREATED, &response)
}
