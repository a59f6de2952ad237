//! # strata
//!
//! Cross-cutting HTTP concerns for a single async endpoint. Nothing more.
//!
//! ## The contract
//!
//! You write the business logic: take a typed input, return a status and a
//! typed body. strata wraps it in four layers, always in this order:
//!
//! ```text
//! AccessLog → Cors → ErrorBoundary → Json → your handler
//! ```
//!
//! - **AccessLog** times the request and emits one [`AccessRecord`].
//! - **Cors** rejects origins not on the allow-list with `403`, and stamps
//!   `Access-Control-Allow-*` headers on everything else.
//! - **ErrorBoundary** turns any error or panic below it into
//!   `{"msg":"unhandled error","code":500}`.
//! - **Json** parses and validates the body (`400` / `422` on failure), calls
//!   your handler, and serializes its [`Reply`].
//!
//! Every layer, and the assembled [`Pipeline`], has the same shape:
//! `Request → Future<Envelope>`.
//!
//! What strata does not do: routing, authentication, non-JSON bodies, or
//! sockets. The transport hands over a [`Request`] and receives an
//! [`Envelope`]; [`Request::from_http`] and [`Envelope::into_http`] bridge to
//! the `http` crate's types.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use strata::{ApiContext, CorsConfig, Field, ObjectSchema, Pipeline, Reply, Request};
//!
//! #[derive(Deserialize)]
//! struct Greet { first: String, last: String }
//!
//! #[derive(Serialize)]
//! struct Greeting { message: String }
//!
//! async fn greet(input: Greet, _ctx: ApiContext) -> anyhow::Result<Reply<Greeting>> {
//!     let message = format!("Hello, {} {}!", input.first, input.last);
//!     Ok(Reply::ok(Greeting { message }))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let schema = ObjectSchema::new()
//!         .field("first", Field::string().min_len(1).required())
//!         .field("last", Field::string().min_len(1).required());
//!
//!     let api = Pipeline::builder()
//!         .cors(CorsConfig::new(["https://example.com"], true))
//!         .body_with_schema(greet, schema);
//!
//!     let req = Request::new()
//!         .with_dispatch("POST", "/greet")
//!         .with_header("Origin", "https://example.com")
//!         .with_body(r#"{"first":"Ada","last":"Lovelace"}"#);
//!
//!     let env = api.handle(req).await;
//!     assert_eq!(env.body(), Some(r#"{"message":"Hello, Ada Lovelace!"}"#));
//! }
//! ```

mod envelope;
mod error;
mod handler;
mod pipeline;
mod request;
mod schema;
mod status;

pub mod middleware;

pub use envelope::{Envelope, ErrorBody, HeaderValue};
pub use error::Error;
pub use handler::{BoxFuture, BoxedHandler, FnHandler, Handler, HandlerResult, handler_fn};
pub use middleware::{
    AccessLog, AccessObserver, AccessRecord, ApiContext, Clock, Cors, CorsConfig, ErrorBoundary,
    ErrorObserver, JsonBody, JsonQuery, Reply, StdoutAccessLog, SystemClock, TracingAccessLog,
    TracingErrorObserver, ValidationError,
};
pub use pipeline::{Pipeline, PipelineBuilder, build_body_api, build_query_api};
pub use request::{Dispatch, Request};
pub use schema::{Field, FieldError, ObjectSchema, Schema};
pub use status::StatusClass;
