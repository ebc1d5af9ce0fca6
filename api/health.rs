use vercel_runtime::{run, Body, Error, Request, Response, StatusCode};
use serde_json::json;
use lanche_payments::api::json_response;
use lanche_payments::version;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lanche_payments::init_tracing();
    run(handler).await
}

pub async fn handler(_req: Request) -> Result<Response<Body>, Error> {
    let payload = json!({
        "status": "ok",
        "version": version(),
    });

    json_response(StatusCode::OK, &payload)
}
