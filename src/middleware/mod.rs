//! The four middleware layers.
//!
//! Each layer is a [`Handler`](crate::Handler) that wraps another handler.
//! [`Pipeline`](crate::Pipeline) nests them in a fixed order, outermost
//! first:
//!
//! 1. [`AccessLog`]: times the request and records the final envelope.
//! 2. [`Cors`]: rejects disallowed origins, stamps CORS headers.
//! 3. [`ErrorBoundary`]: contains anything that escapes below it.
//! 4. [`JsonQuery`] / [`JsonBody`]: parse, validate, call the API, serialize.
//!
//! The layers are public so a stack can also be assembled by hand.

pub mod access_log;
pub mod boundary;
pub mod cors;
pub mod json;

pub use access_log::{
    AccessLog, AccessObserver, AccessRecord, Clock, StdoutAccessLog, SystemClock,
    TracingAccessLog,
};
pub use boundary::{ErrorBoundary, ErrorObserver, TracingErrorObserver};
pub use cors::{Cors, CorsConfig};
pub use json::{ApiContext, JsonBody, JsonQuery, Reply, ValidationError};
