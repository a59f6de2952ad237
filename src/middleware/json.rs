//! JSON request parsing, validation, and response serialization.
//!
//! Two entry shapes share one serialization rule, the business handler's
//! [`Reply`] becomes the envelope: `status` verbatim, `body` as JSON text.
//!
//! - [`JsonQuery`]: no body. Calls the API with an [`ApiContext`] only.
//! - [`JsonBody`]: parses the raw body, optionally validates it against a
//!   [`Schema`], decodes it into the API's input type, then calls the API.
//!
//! Rejections are returned, not raised:
//!
//! | Condition | Status | Body |
//! |---|---|---|
//! | body absent or not JSON | 400 | `{"msg":"invalid body, expected JSON","code":400}` |
//! | JSON nested past the parser's depth limit (128) | 400 | same as above |
//! | schema violations | 422 | `{"msg":"JSON body failed validation","errors":[..]}` |
//! | JSON does not fit the input type | 422 | same shape, one entry, empty path |
//!
//! The nesting cap is `serde_json`'s recursion limit. It keeps a hostile
//! body from exhausting the stack while parsing.
//!
//! Errors from the API itself, and output that fails to serialize, are
//! propagated for the error boundary to contain.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::Error;
use crate::handler::{BoxFuture, Handler, HandlerResult};
use crate::request::Request;
use crate::schema::{FieldError, Schema};

pub const INVALID_BODY: &str = "invalid body, expected JSON";
pub const FAILED_VALIDATION: &str = "JSON body failed validation";

// ── Business-facing types ────────────────────────────────────────────────────

/// What a business handler returns: a status code and a typed body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply<T> {
    pub status: u16,
    pub body: T,
}

impl<T> Reply<T> {
    pub fn new(status: u16, body: T) -> Self {
        Self { status, body }
    }

    /// `200` with `body`.
    pub fn ok(body: T) -> Self {
        Self::new(200, body)
    }
}

/// Gives a business handler access to the full incoming request.
#[derive(Clone, Debug)]
pub struct ApiContext {
    request: Request,
}

impl ApiContext {
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &Request { &self.request }

    pub fn into_request(self) -> Request { self.request }
}

/// The `422` body: a fixed message plus one entry per violation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ValidationError {
    pub msg: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { msg: FAILED_VALIDATION.to_owned(), errors }
    }

    fn into_envelope(self) -> Envelope {
        // Two strings per entry; serializing cannot fail.
        let body = serde_json::to_string(&self).unwrap_or_else(|_| {
            format!(r#"{{"msg":"{FAILED_VALIDATION}","errors":[]}}"#)
        });
        Envelope::from_raw(422, body)
    }
}

fn reply_envelope<O: Serialize>(reply: Reply<O>) -> HandlerResult {
    Envelope::json(&reply.body, reply.status)
}

// ── JsonQuery ────────────────────────────────────────────────────────────────

/// Wraps a body-less API: `Fn(ApiContext) -> Future<anyhow::Result<Reply<O>>>`.
pub struct JsonQuery<F> {
    api: F,
}

impl<F> JsonQuery<F> {
    pub fn new(api: F) -> Self {
        Self { api }
    }
}

impl<F, Fut, O> Handler for JsonQuery<F>
where
    F: Fn(ApiContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Reply<O>>> + Send + 'static,
    O: Serialize + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        let fut = (self.api)(ApiContext::new(req));
        Box::pin(async move {
            let reply = fut.await.map_err(Error::Handler)?;
            reply_envelope(reply)
        })
    }
}

// ── JsonBody ─────────────────────────────────────────────────────────────────

/// Wraps an API that takes a JSON body:
/// `Fn(I, ApiContext) -> Future<anyhow::Result<Reply<O>>>`.
pub struct JsonBody<F, I> {
    api: F,
    schema: Option<Arc<dyn Schema>>,
    _input: PhantomData<fn() -> I>,
}

impl<F, I> JsonBody<F, I> {
    pub fn new(api: F) -> Self {
        Self { api, schema: None, _input: PhantomData }
    }

    /// Validates every parsed body against `schema` before decoding it.
    pub fn with_schema(mut self, schema: impl Schema) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Parse, validate and decode. `Err` carries the short-circuit envelope.
    fn decode(&self, req: &Request) -> Result<I, Envelope>
    where
        I: DeserializeOwned,
    {
        let value: Value = req.body()
            .and_then(|body| serde_json::from_str::<Value>(body).ok())
            .ok_or_else(|| {
                debug!(path = req.path(), "request body is not JSON");
                Envelope::error(INVALID_BODY, 400)
            })?;

        if let Some(schema) = &self.schema {
            let errors = schema.validate(&value);
            if !errors.is_empty() {
                debug!(path = req.path(), violations = errors.len(), "request body failed validation");
                return Err(ValidationError::new(errors).into_envelope());
            }
        }

        serde_json::from_value(value).map_err(|e| {
            debug!(path = req.path(), error = %e, "request body does not fit the input type");
            ValidationError::new(vec![FieldError::new(e.to_string(), "")]).into_envelope()
        })
    }
}

impl<F, I, Fut, O> Handler for JsonBody<F, I>
where
    F: Fn(I, ApiContext) -> Fut + Send + Sync + 'static,
    I: DeserializeOwned + 'static,
    Fut: Future<Output = anyhow::Result<Reply<O>>> + Send + 'static,
    O: Serialize + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        let input = match self.decode(&req) {
            Ok(input) => input,
            Err(rejection) => return Box::pin(async move { Ok(rejection) }),
        };
        let fut = (self.api)(input, ApiContext::new(req));
        Box::pin(async move {
            let reply = fut.await.map_err(Error::Handler)?;
            reply_envelope(reply)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, ObjectSchema};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct HelloInput {
        first: String,
        last: String,
    }

    #[derive(Serialize)]
    struct HelloOutput {
        message: String,
    }

    async fn hello_world(_ctx: ApiContext) -> anyhow::Result<Reply<HelloOutput>> {
        Ok(Reply::ok(HelloOutput { message: "Hello, World!".to_owned() }))
    }

    async fn greeter(input: HelloInput, _ctx: ApiContext) -> anyhow::Result<Reply<HelloOutput>> {
        Ok(Reply::ok(HelloOutput { message: format!("Hello, {} {}!", input.first, input.last) }))
    }

    fn name_schema() -> ObjectSchema {
        ObjectSchema::new()
            .field("first", Field::string().min_len(1).required())
            .field("last", Field::string().min_len(1).required())
    }

    #[tokio::test]
    async fn query_returns_json() {
        let h = JsonQuery::new(hello_world);
        let env = h.call(Request::new()).await.unwrap();
        assert_eq!(env.status(), 200);
        assert_eq!(env.body(), Some(r#"{"message":"Hello, World!"}"#));
    }

    #[tokio::test]
    async fn query_sees_the_request() {
        let h = JsonQuery::new(|ctx: ApiContext| async move {
            let path = ctx.request().path().to_owned();
            Ok(Reply::new(202, path))
        });
        let env = h.call(Request::new().with_dispatch("GET", "/where")).await.unwrap();
        assert_eq!(env.status(), 202);
        assert_eq!(env.body(), Some(r#""/where""#));
    }

    #[tokio::test]
    async fn query_propagates_api_errors() {
        let h = JsonQuery::new(|_ctx: ApiContext| async {
            Err::<Reply<()>, _>(anyhow::anyhow!("backend down"))
        });
        let err = h.call(Request::new()).await.unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
    }

    #[tokio::test]
    async fn body_returns_json() {
        let h = JsonBody::new(greeter);
        let req = Request::new().with_body(r#"{"first":"Keith","last":"Jackson"}"#);
        let env = h.call(req).await.unwrap();
        assert_eq!(env.status(), 200);
        assert_eq!(env.body(), Some(r#"{"message":"Hello, Keith Jackson!"}"#));
    }

    #[tokio::test]
    async fn invalid_json_is_rejected_before_the_api_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let h = JsonBody::new(move |input: HelloInput, ctx: ApiContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            greeter(input, ctx)
        });

        for body in [Some("{ ____ invalid JSON ____ }"), Some(""), None] {
            let req = match body {
                Some(b) => Request::new().with_body(b),
                None => Request::new(),
            };
            let env = h.call(req).await.unwrap();
            assert_eq!(env.status(), 400);
            assert_eq!(env.body(), Some(r#"{"msg":"invalid body, expected JSON","code":400}"#));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nesting_is_capped() {
        let h = JsonBody::new(|input: Value, _ctx: ApiContext| async move {
            Ok(Reply::ok(input.is_array()))
        });
        let nested = |depth: usize| format!("{}{}", "[".repeat(depth), "]".repeat(depth));

        let env = h.call(Request::new().with_body(nested(100))).await.unwrap();
        assert_eq!(env.status(), 200);
        assert_eq!(env.body(), Some("true"));

        let env = h.call(Request::new().with_body(nested(200))).await.unwrap();
        assert_eq!(env.status(), 400);
        assert_eq!(env.body(), Some(r#"{"msg":"invalid body, expected JSON","code":400}"#));
    }

    #[tokio::test]
    async fn schema_reports_every_violation() {
        let h = JsonBody::new(greeter).with_schema(name_schema());
        let env = h.call(Request::new().with_body(r#"{"first":""}"#)).await.unwrap();

        assert_eq!(env.status(), 422);
        assert_eq!(
            env.body(),
            Some(concat!(
                r#"{"msg":"JSON body failed validation","errors":["#,
                r#"{"msg":"\"first\" length must be at least 1 characters long","path":"first"},"#,
                r#"{"msg":"\"last\" is required","path":"last"}]}"#,
            )),
        );
    }

    #[tokio::test]
    async fn schema_passes_valid_bodies_through() {
        let h = JsonBody::new(greeter).with_schema(name_schema());
        let req = Request::new().with_body(r#"{"first":"Ada","last":"Lovelace"}"#);
        let env = h.call(req).await.unwrap();
        assert_eq!(env.body(), Some(r#"{"message":"Hello, Ada Lovelace!"}"#));
    }

    #[tokio::test]
    async fn mismatched_shape_without_schema_is_unprocessable() {
        let h = JsonBody::new(greeter);
        let env = h.call(Request::new().with_body(r#"{"first":"Ada"}"#)).await.unwrap();

        assert_eq!(env.status(), 422);
        let body: Value = serde_json::from_str(env.body().unwrap()).unwrap();
        assert_eq!(body["msg"], FAILED_VALIDATION);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["errors"][0]["path"], "");
        assert!(body["errors"][0]["msg"].as_str().unwrap().contains("last"));
    }

    #[tokio::test]
    async fn unserializable_output_is_an_error() {
        let h = JsonQuery::new(|_ctx: ApiContext| async {
            let mut bad = std::collections::HashMap::new();
            bad.insert(vec![1_u8], "non-string key");
            Ok(Reply::ok(bad))
        });
        let err = h.call(Request::new()).await.unwrap_err();
        assert!(matches!(err, Error::Serialize(_)));
    }
}
