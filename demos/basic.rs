//! Minimal strata example: one query-style and one body-style endpoint,
//! driven with hand-built requests.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Restrict origins with a comma-separated allow-list:
//!   STRATA_CORS_ALLOW=https://example.com cargo run --example basic

use serde::{Deserialize, Serialize};
use strata::{
    ApiContext, CorsConfig, Field, ObjectSchema, Pipeline, Reply, Request, TracingAccessLog,
};

#[derive(Deserialize)]
struct Greet {
    first: String,
    last: String,
}

#[derive(Serialize)]
struct Message {
    message: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let cors = std::env::var("STRATA_CORS_ALLOW")
        .map(|list| CorsConfig::from_list(&list))
        .unwrap_or_default();

    let hello_api = Pipeline::builder().cors(cors.clone()).query(hello);

    let schema = ObjectSchema::new()
        .field("first", Field::string().min_len(1).required())
        .field("last", Field::string().min_len(1).required());
    let greet_api = Pipeline::builder()
        .cors(cors)
        .on_request_complete(TracingAccessLog)
        .body_with_schema(greet, schema);

    let requests = [
        (&hello_api, Request::new().with_dispatch("GET", "/hello")),
        (&hello_api, Request::new().with_dispatch("GET", "/hello").with_header("Origin", "https://example.com")),
        (&greet_api, Request::new().with_dispatch("POST", "/greet").with_body(r#"{"first":"Ada","last":"Lovelace"}"#)),
        (&greet_api, Request::new().with_dispatch("POST", "/greet").with_body("not json")),
        (&greet_api, Request::new().with_dispatch("POST", "/greet").with_body(r#"{"first":""}"#)),
        (&greet_api, Request::new().with_dispatch("POST", "/greet").with_body(r#"{"first":"crash","last":"now"}"#)),
    ];

    for (api, req) in requests {
        let env = api.handle(req).await;
        println!("{} {}", env.status(), env.body().unwrap_or_default());
    }
}

// GET /hello
async fn hello(_ctx: ApiContext) -> anyhow::Result<Reply<Message>> {
    Ok(Reply::ok(Message { message: "Hello, World!".to_owned() }))
}

// POST /greet: "crash" as a first name exercises the error boundary.
async fn greet(input: Greet, _ctx: ApiContext) -> anyhow::Result<Reply<Message>> {
    anyhow::ensure!(input.first != "crash", "refusing to greet {}", input.last);
    let message = format!("Hello, {} {}!", input.first, input.last);
    Ok(Reply::ok(Message { message }))
}
