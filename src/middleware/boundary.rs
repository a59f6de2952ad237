//! Exception boundary around the business logic.
//!
//! [`ErrorBoundary`] turns anything that escapes the layers it wraps into a
//! fixed `500` envelope: an `Err` result, a panic while the inner handler
//! builds its future, or a panic while that future runs. The original
//! request and error go to an [`ErrorObserver`]; the client only ever sees
//! `{"msg":"unhandled error","code":500}`.
//!
//! It knows nothing about CORS or JSON. The JSON layer's `400`/`422`
//! rejections are ordinary `Ok` envelopes and pass straight through.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, warn};

use crate::envelope::Envelope;
use crate::error::Error;
use crate::handler::{BoxFuture, Handler, HandlerResult};
use crate::request::Request;

pub const UNHANDLED: &str = "unhandled error";

/// Receives every error the boundary contains.
///
/// Called at most once per request. A panicking observer is caught and
/// logged; it never changes the response.
pub trait ErrorObserver: Send + Sync + 'static {
    fn on_error(&self, req: &Request, err: &Error);
}

impl<F> ErrorObserver for F
where
    F: Fn(&Request, &Error) + Send + Sync + 'static,
{
    fn on_error(&self, req: &Request, err: &Error) {
        self(req, err)
    }
}

/// Default observer: one `error`-level tracing event per contained error.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorObserver;

impl ErrorObserver for TracingErrorObserver {
    fn on_error(&self, req: &Request, err: &Error) {
        error!(method = req.method(), path = req.path(), error = %err, "unhandled error");
    }
}

/// See the [module docs](self).
pub struct ErrorBoundary<H> {
    inner: H,
    observer: Arc<dyn ErrorObserver>,
}

impl<H: Handler> ErrorBoundary<H> {
    /// Wraps `inner`, reporting to [`TracingErrorObserver`].
    pub fn new(inner: H) -> Self {
        Self { inner, observer: Arc::new(TracingErrorObserver) }
    }

    pub fn with_observer(mut self, observer: impl ErrorObserver) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub(crate) fn with_shared_observer(mut self, observer: Arc<dyn ErrorObserver>) -> Self {
        self.observer = observer;
        self
    }
}

impl<H: Handler> Handler for ErrorBoundary<H> {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        let observer = Arc::clone(&self.observer);
        let original = req.clone();

        let fut = match panic::catch_unwind(AssertUnwindSafe(|| self.inner.call(req))) {
            Ok(fut) => fut,
            Err(payload) => {
                let env = contain(observer.as_ref(), &original, &Error::from_panic(payload));
                return Box::pin(async move { Ok(env) });
            }
        };

        Box::pin(async move {
            let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(Error::from_panic(payload)),
            };
            Ok(match outcome {
                Ok(env) => env,
                Err(err) => contain(observer.as_ref(), &original, &err),
            })
        })
    }
}

fn contain(observer: &dyn ErrorObserver, req: &Request, err: &Error) -> Envelope {
    if panic::catch_unwind(AssertUnwindSafe(|| observer.on_error(req, err))).is_err() {
        warn!(path = req.path(), "error observer panicked");
    }
    Envelope::error(UNHANDLED, 500)
}
