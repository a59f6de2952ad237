//! Access logging.
//!
//! [`AccessLog`] is the outermost layer. It reads the clock on entry and on
//! return, builds one [`AccessRecord`] from the final envelope (short-circuit
//! rejections included), hands it to an [`AccessObserver`], and returns the
//! envelope untouched.
//!
//! Serialized, a record looks like:
//!
//! ```text
//! {"time":"2000-01-01T00:00:00.000Z","src":"rl","status":200,"http_2xx":1,
//!  "len":11,"ms":100,"method":"GET","path":"/hello"}
//! ```

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{Instrument, info, info_span, warn};

use crate::envelope::Envelope;
use crate::handler::{BoxFuture, Handler, HandlerResult};
use crate::request::Request;
use crate::status::StatusClass;

// ── Clock ────────────────────────────────────────────────────────────────────

/// Source of wall-clock time for access records.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
{
    fn now(&self) -> DateTime<Utc> { self() }
}

// ── AccessRecord ─────────────────────────────────────────────────────────────

/// One request, as the access log sees it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccessRecord {
    /// When the request entered the pipeline.
    #[serde(serialize_with = "iso_millis")]
    pub time: DateTime<Utc>,
    /// When the envelope came back.
    #[serde(skip)]
    pub end: DateTime<Utc>,
    pub src: &'static str,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_1xx: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_2xx: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_3xx: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_4xx: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_5xx: Option<u8>,
    /// Body length in UTF-16 code units, as a JavaScript string's
    /// `length` counts them; `0` without a body.
    pub len: usize,
    /// `end - time` in milliseconds, never negative.
    pub ms: i64,
    pub method: String,
    pub path: String,
}

impl AccessRecord {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        method: &str,
        path: &str,
        env: &Envelope,
    ) -> Self {
        let class = StatusClass::of(env.status());
        let bucket = |c: StatusClass| (class == Some(c)).then_some(1);
        Self {
            time: start,
            end,
            src: "rl",
            status: env.status(),
            http_1xx: bucket(StatusClass::Informational),
            http_2xx: bucket(StatusClass::Success),
            http_3xx: bucket(StatusClass::Redirection),
            http_4xx: bucket(StatusClass::ClientError),
            http_5xx: bucket(StatusClass::ServerError),
            len: env.body().map_or(0, |b| b.encode_utf16().count()),
            ms: (end - start).num_milliseconds().max(0),
            method: method.to_owned(),
            path: path.to_owned(),
        }
    }
}

fn iso_millis<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&t.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
}

// ── Observers ────────────────────────────────────────────────────────────────

/// Receives one [`AccessRecord`] per completed request.
pub trait AccessObserver: Send + Sync + 'static {
    fn on_request_complete(&self, record: &AccessRecord);
}

impl<F> AccessObserver for F
where
    F: Fn(&AccessRecord) + Send + Sync + 'static,
{
    fn on_request_complete(&self, record: &AccessRecord) {
        self(record)
    }
}

/// Default observer: one JSON line per request on stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutAccessLog;

impl AccessObserver for StdoutAccessLog {
    fn on_request_complete(&self, record: &AccessRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "could not serialize access record");
                return;
            }
        };
        if let Err(e) = writeln!(std::io::stdout().lock(), "{line}") {
            warn!(error = %e, "could not write access record");
        }
    }
}

/// Emits each record as a structured `info` event instead of raw JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAccessLog;

impl AccessObserver for TracingAccessLog {
    fn on_request_complete(&self, r: &AccessRecord) {
        info!(
            status = r.status,
            len = r.len,
            ms = r.ms,
            method = %r.method,
            path = %r.path,
            "request completed"
        );
    }
}

// ── Layer ────────────────────────────────────────────────────────────────────

/// See the [module docs](self).
pub struct AccessLog<H> {
    inner: H,
    observer: Arc<dyn AccessObserver>,
    clock: Arc<dyn Clock>,
}

impl<H: Handler> AccessLog<H> {
    /// Wraps `inner`, logging to [`StdoutAccessLog`] with the system clock.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            observer: Arc::new(StdoutAccessLog),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_observer(mut self, observer: impl AccessObserver) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub(crate) fn with_shared(
        mut self,
        observer: Arc<dyn AccessObserver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        self.observer = observer;
        self.clock = clock;
        self
    }
}

impl<H: Handler> Handler for AccessLog<H> {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        let observer = Arc::clone(&self.observer);
        let clock = Arc::clone(&self.clock);
        let method = req.method().to_owned();
        let path = req.path().to_owned();
        let span = info_span!("request", method = %method, path = %path);

        let start = clock.now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let result = fut.await;
                let end = clock.now();

                match &result {
                    Ok(env) => {
                        let record = AccessRecord::new(start, end, &method, &path, env);
                        let observed = panic::catch_unwind(AssertUnwindSafe(|| {
                            observer.on_request_complete(&record)
                        }));
                        if observed.is_err() {
                            warn!("access observer panicked");
                        }
                    }
                    Err(e) => warn!(error = %e, "no envelope to log, error escaped the pipeline"),
                }
                result
            }
            .instrument(span),
        )
    }
}
