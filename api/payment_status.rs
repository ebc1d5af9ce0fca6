use lanche_payments::api::{error_response, json_response, method_not_allowed, query_param};
use lanche_payments::PaymentSimulator;
use vercel_runtime::{run, Body, Error, Request, Response, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Error> {
    lanche_payments::init_tracing();
    run(handler).await
}

/// GET /api/payment_status?payment_id=... — Sandbox status lookup.
///
/// Serverless instances share no memory, so this answers from the payment
/// id alone, the way the sandbox gateway does.
pub async fn handler(req: Request) -> Result<Response<Body>, Error> {
    if *req.method() != http::Method::GET {
        return method_not_allowed("Use GET with ?payment_id= to query a payment");
    }

    let Some(payment_id) = query_param(req.uri().query(), "payment_id") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing field", "payment_id is required");
    };

    let status = PaymentSimulator::default().get_payment_status(payment_id);
    json_response(StatusCode::OK, &status)
}
