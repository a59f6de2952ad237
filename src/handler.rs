//! Handler trait and type erasure.
//!
//! # One shape for every layer
//!
//! Every layer in the pipeline, and the business endpoint at its core, has
//! the same signature: take a [`Request`], return a future of an
//! [`Envelope`] (or an [`Error`] the error boundary will contain). Because
//! the shape is shared, layers compose by plain nesting:
//!
//! ```text
//! AccessLog { Cors { ErrorBoundary { JsonBody { api } } } }
//! ```
//!
//! The composed stack is erased once, into a [`BoxedHandler`], so that a
//! [`Pipeline`](crate::Pipeline) has a single concrete type no matter which
//! business handler it wraps.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::envelope::Envelope;
use crate::error::Error;
use crate::request::Request;

/// A heap-allocated, type-erased future.
///
/// `Pin<Box<…>>` lets the executor poll it in place; `Send + 'static` lets
/// a multi-threaded runtime move it between worker threads.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What every handler resolves to.
pub type HandlerResult = Result<Envelope, Error>;

/// A request-to-envelope step. Implemented by every layer.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        (**self).call(req)
    }
}

// ── Closures ─────────────────────────────────────────────────────────────────

/// Turns an async closure into a [`Handler`].
///
/// ```rust
/// use strata::{handler_fn, Envelope, Request};
///
/// let ok = handler_fn(|_req: Request| async { Ok(Envelope::ok()) });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler(f)
}

/// Newtype returned by [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        Box::pin((self.0)(req))
    }
}
