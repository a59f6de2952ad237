//! Pipeline assembly.
//!
//! A [`Pipeline`] is the fixed stack
//!
//! ```text
//! AccessLog ∘ Cors ∘ ErrorBoundary ∘ JsonQuery       (query-style APIs)
//! AccessLog ∘ Cors ∘ ErrorBoundary ∘ JsonBody        (body-style APIs)
//! ```
//!
//! around one business handler. The order cannot be changed; what can be
//! supplied at construction time is the CORS configuration, the schema,
//! the two observers, and the clock.
//!
//! ```rust
//! use strata::{ApiContext, CorsConfig, Pipeline, Reply, Request};
//!
//! async fn hello(_ctx: ApiContext) -> anyhow::Result<Reply<&'static str>> {
//!     Ok(Reply::ok("hi"))
//! }
//!
//! # async fn run() {
//! let api = Pipeline::builder()
//!     .cors(CorsConfig::new(["https://example.com"], true))
//!     .query(hello);
//!
//! let env = api.handle(Request::new().with_dispatch("GET", "/hello")).await;
//! assert_eq!(env.body(), Some(r#""hi""#));
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::envelope::Envelope;
use crate::handler::{BoxFuture, BoxedHandler, Handler, HandlerResult};
use crate::middleware::boundary::UNHANDLED;
use crate::middleware::{
    AccessLog, AccessObserver, ApiContext, Clock, Cors, CorsConfig, ErrorBoundary, ErrorObserver,
    JsonBody, JsonQuery, Reply, StdoutAccessLog, SystemClock, TracingErrorObserver,
};
use crate::request::Request;
use crate::schema::Schema;

/// A fully assembled middleware stack. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    inner: BoxedHandler,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Wraps a hand-assembled stack.
    pub fn new(handler: impl Handler) -> Self {
        Self { inner: Arc::new(handler) }
    }

    /// Runs one request through the stack. Never fails: an error that
    /// reaches this point becomes the `500` envelope.
    pub async fn handle(&self, req: Request) -> Envelope {
        match self.inner.call(req).await {
            Ok(env) => env,
            Err(err) => {
                error!(error = %err, "error escaped the pipeline");
                Envelope::error(UNHANDLED, 500)
            }
        }
    }
}

impl Handler for Pipeline {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        self.inner.call(req)
    }
}

/// Collects the per-pipeline configuration, then wraps a business handler.
pub struct PipelineBuilder {
    cors: CorsConfig,
    on_error: Arc<dyn ErrorObserver>,
    on_request_complete: Arc<dyn AccessObserver>,
    clock: Arc<dyn Clock>,
}

impl Default for PipelineBuilder {
    /// Every origin allowed, errors to tracing, access records to stdout.
    fn default() -> Self {
        Self {
            cors: CorsConfig::default(),
            on_error: Arc::new(TracingErrorObserver),
            on_request_complete: Arc::new(StdoutAccessLog),
            clock: Arc::new(SystemClock),
        }
    }
}

impl PipelineBuilder {
    pub fn cors(mut self, config: CorsConfig) -> Self {
        self.cors = config;
        self
    }

    pub fn on_error(mut self, observer: impl ErrorObserver) -> Self {
        self.on_error = Arc::new(observer);
        self
    }

    pub fn on_request_complete(mut self, observer: impl AccessObserver) -> Self {
        self.on_request_complete = Arc::new(observer);
        self
    }

    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Wraps a body-less API.
    pub fn query<F, Fut, O>(self, api: F) -> Pipeline
    where
        F: Fn(ApiContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply<O>>> + Send + 'static,
        O: Serialize + Send + 'static,
    {
        self.wrap(JsonQuery::new(api))
    }

    /// Wraps an API that takes a JSON body, without schema validation.
    pub fn body<F, I, Fut, O>(self, api: F) -> Pipeline
    where
        F: Fn(I, ApiContext) -> Fut + Send + Sync + 'static,
        I: DeserializeOwned + 'static,
        Fut: Future<Output = anyhow::Result<Reply<O>>> + Send + 'static,
        O: Serialize + Send + 'static,
    {
        self.wrap(JsonBody::new(api))
    }

    /// Wraps an API that takes a JSON body validated against `schema`.
    pub fn body_with_schema<F, I, Fut, O>(self, api: F, schema: impl Schema) -> Pipeline
    where
        F: Fn(I, ApiContext) -> Fut + Send + Sync + 'static,
        I: DeserializeOwned + 'static,
        Fut: Future<Output = anyhow::Result<Reply<O>>> + Send + 'static,
        O: Serialize + Send + 'static,
    {
        self.wrap(JsonBody::new(api).with_schema(schema))
    }

    fn wrap(self, core: impl Handler) -> Pipeline {
        let contained = ErrorBoundary::new(core).with_shared_observer(self.on_error);
        let cors = Cors::new(contained, self.cors);
        let logged = AccessLog::new(cors).with_shared(self.on_request_complete, self.clock);
        Pipeline::new(logged)
    }
}

/// The default query-style pipeline around `api`.
pub fn build_query_api<F, Fut, O>(api: F) -> Pipeline
where
    F: Fn(ApiContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Reply<O>>> + Send + 'static,
    O: Serialize + Send + 'static,
{
    Pipeline::builder().query(api)
}

/// The default body-style pipeline around `api`.
pub fn build_body_api<F, I, Fut, O>(api: F) -> Pipeline
where
    F: Fn(I, ApiContext) -> Fut + Send + Sync + 'static,
    I: DeserializeOwned + 'static,
    Fut: Future<Output = anyhow::Result<Reply<O>>> + Send + 'static,
    O: Serialize + Send + 'static,
{
    Pipeline::builder().body(api)
}
