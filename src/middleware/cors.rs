//! Origin allow-listing and CORS response headers.

use std::sync::Arc;

use tracing::debug;

use crate::envelope::Envelope;
use crate::handler::{BoxFuture, Handler, HandlerResult};
use crate::request::Request;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";

/// Which origins may call the pipeline. Immutable once built; one instance
/// is shared by every request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CorsConfig {
    allow: Vec<String>,
    allow_credentials: bool,
}

impl CorsConfig {
    /// `allow` entries are compared to the origin by exact string equality;
    /// the entry `"*"` admits every origin.
    pub fn new<I, S>(allow: I, allow_credentials: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: allow.into_iter().map(Into::into).collect(),
            allow_credentials,
        }
    }

    /// Parses a comma-separated allow-list such as
    /// `"https://a.com, https://b.com"`. Blank entries are skipped.
    pub fn from_list(list: &str) -> Self {
        let allow = list.split(',').map(str::trim).filter(|s| !s.is_empty());
        Self::new(allow, true)
    }

    pub fn allow(&self) -> &[String] { &self.allow }

    /// Kept for callers that inspect the configuration. The stamped
    /// `Access-Control-Allow-Credentials` header is always `true`.
    pub fn allow_credentials(&self) -> bool { self.allow_credentials }

    /// `true` when the request carries no origin, or when an entry is `"*"`
    /// or exactly equals the origin.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(origin) => self.allow.iter().any(|entry| entry == "*" || entry == origin),
        }
    }
}

impl Default for CorsConfig {
    /// Every origin, credentials allowed.
    fn default() -> Self {
        Self::new(["*"], true)
    }
}

/// Rejects disallowed origins with `403`; stamps CORS headers on every
/// response it lets through.
///
/// The stamped headers are always `Access-Control-Allow-Origin: *` and
/// `Access-Control-Allow-Credentials: true`, whichever entry matched.
pub struct Cors<H> {
    inner: H,
    config: Arc<CorsConfig>,
}

impl<H: Handler> Cors<H> {
    pub fn new(inner: H, config: CorsConfig) -> Self {
        Self { inner, config: Arc::new(config) }
    }
}

impl<H: Handler> Handler for Cors<H> {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        if !self.config.is_allowed(req.origin()) {
            let origin = req.origin().unwrap_or_default();
            debug!(origin, path = req.path(), "rejecting CORS origin");
            let env = Envelope::error(format!("invalid CORS origin: '{origin}'"), 403);
            return Box::pin(async move { Ok(env) });
        }

        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut env = fut.await?;
            env.set_header(ALLOW_ORIGIN, "*");
            env.set_header(ALLOW_CREDENTIALS, true);
            Ok(env)
        })
    }
}
