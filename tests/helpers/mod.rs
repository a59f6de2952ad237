//! Shared test helpers.

#![allow(dead_code)]

mod observers;

pub use observers::{AccessRecorder, ErrorRecorder, scripted_clock};

use serde::{Deserialize, Serialize};
use strata::{ApiContext, Reply, Request};

#[derive(Debug, Deserialize, Serialize)]
pub struct HelloInput {
    pub first: String,
    pub last: String,
}

#[derive(Debug, Serialize)]
pub struct HelloOutput {
    pub message: String,
}

pub async fn hello_world(_ctx: ApiContext) -> anyhow::Result<Reply<HelloOutput>> {
    Ok(Reply::ok(HelloOutput { message: "Hello, World!".to_owned() }))
}

pub async fn greeter(input: HelloInput, _ctx: ApiContext) -> anyhow::Result<Reply<HelloOutput>> {
    let message = format!("Hello, {} {}!", input.first, input.last);
    Ok(Reply::ok(HelloOutput { message }))
}

/// A GET request with dispatch context and, optionally, an origin.
pub fn get(path: &str, origin: Option<&str>) -> Request {
    let req = Request::new().with_dispatch("GET", path);
    match origin {
        Some(o) => req.with_header("Origin", o),
        None => req,
    }
}

/// A POST request carrying `body`.
pub fn post(path: &str, body: &str) -> Request {
    Request::new().with_dispatch("POST", path).with_body(body)
}

/// Parses an envelope body back into JSON for structural assertions.
pub fn body_json(env: &strata::Envelope) -> serde_json::Value {
    serde_json::from_str(env.body().expect("envelope has a body")).expect("body is JSON")
}
