use lanche_payments::api::{body_bytes, error_response, json_response, method_not_allowed};
use lanche_payments::models::payment::WebhookEvent;
use lanche_payments::simulator::config::SimulatorConfig;
use lanche_payments::webhook::SIGNATURE_HEADER;
use lanche_payments::PaymentSimulator;
use serde_json::json;
use tracing::{error, info};
use vercel_runtime::{run, Body, Error, Request, Response, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Error> {
    lanche_payments::init_tracing();
    run(handler).await
}

/// POST /api/webhook — Receive a gateway status notification.
///
/// The signature is read from the `X-Signature` header, falling back to the
/// `signature` field of the event body. Applying the event to stored orders
/// is left to the order service; this endpoint only verifies and echoes it.
pub async fn handler(req: Request) -> Result<Response<Body>, Error> {
    if *req.method() != http::Method::POST {
        return method_not_allowed("Use POST to deliver a webhook event");
    }

    let simulator = match SimulatorConfig::from_env().and_then(PaymentSimulator::new) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!(error = %e, "could not configure payment simulator");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error",
                &e.to_string(),
            );
        }
    };

    let event: WebhookEvent = match serde_json::from_slice(body_bytes(req.body())) {
        Ok(event) => event,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "Malformed event", &e.to_string())
        }
    };

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| event.signature.clone());

    let payload = event.signing_payload()?;
    if !simulator.validate_webhook_signature(&payload, &signature) {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid signature",
            "Webhook signature did not verify",
        );
    }

    info!(payment_id = %event.payment_id, status = %event.status, "accepted webhook event");
    json_response(
        StatusCode::OK,
        &json!({
            "received": true,
            "payment_id": event.payment_id,
            "status": event.status,
        }),
    )
}
