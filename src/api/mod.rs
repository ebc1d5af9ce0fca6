//! Helpers shared by the serverless handlers in `api/`.

use serde::Serialize;
use serde_json::json;
use vercel_runtime::{Body, Error, Response, StatusCode};

use crate::error::PaymentError;

/// Build a JSON response with the given status.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    payload: &T,
) -> Result<Response<Body>, Error> {
    let body = serde_json::to_string(payload)?;
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::Text(body))?)
}

/// `{"error": ..., "message": ...}` with the given status.
pub fn error_response(
    status: StatusCode,
    error: &str,
    message: &str,
) -> Result<Response<Body>, Error> {
    json_response(status, &json!({ "error": error, "message": message }))
}

/// 405 for handlers that accept a single method.
pub fn method_not_allowed(hint: &str) -> Result<Response<Body>, Error> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", hint)
}

/// Map a payment error to a client-facing response.
pub fn payment_error_response(err: &PaymentError) -> Result<Response<Body>, Error> {
    let (status, error) = match err {
        PaymentError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "Invalid amount"),
        PaymentError::MissingField(_) => (StatusCode::BAD_REQUEST, "Missing field"),
        PaymentError::UnsupportedMethod(_) => {
            (StatusCode::BAD_REQUEST, "Unsupported payment method")
        }
        PaymentError::Serialization(_) => (StatusCode::BAD_REQUEST, "Malformed JSON"),
        PaymentError::UnknownPayment(_) => (StatusCode::NOT_FOUND, "Unknown payment"),
        PaymentError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "Invalid status transition")
        }
        PaymentError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error"),
    };
    error_response(status, error, &err.to_string())
}

/// Raw request body bytes.
pub fn body_bytes(body: &Body) -> &[u8] {
    match body {
        Body::Empty => &[],
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
    }
}

/// First value of `name` in a `k=v&k2=v2` query string.
pub fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
