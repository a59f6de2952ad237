//! The response envelope every layer returns.
//!
//! An [`Envelope`] is the status/body/headers triple passed back up through
//! the layers. The JSON layer (or whichever layer short-circuits) sets the
//! body; layers above it may only add headers.
//!
//! ```rust
//! use strata::Envelope;
//!
//! let env = Envelope::error("invalid body, expected JSON", 400);
//! assert_eq!(env.status(), 400);
//! assert_eq!(env.body(), Some(r#"{"msg":"invalid body, expected JSON","code":400}"#));
//! ```

use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;
use tracing::warn;

use crate::error::Error;

// ── HeaderValue ──────────────────────────────────────────────────────────────

/// A response header value: text, or a boolean flag such as
/// `Access-Control-Allow-Credentials: true`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Flag(bool),
}

impl HeaderValue {
    fn render(&self) -> String {
        match self {
            Self::Text(s)     => s.clone(),
            Self::Flag(true)  => "true".to_owned(),
            Self::Flag(false) => "false".to_owned(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<bool> for HeaderValue {
    fn from(b: bool) -> Self { Self::Flag(b) }
}

// ── Error bodies ─────────────────────────────────────────────────────────────

/// The JSON shape of every fixed error response: `{"msg":..,"code":..}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ErrorBody {
    pub msg: String,
    pub code: u16,
}

// ── Envelope ─────────────────────────────────────────────────────────────────

/// Status code, JSON body and headers of one response.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub(crate) status: u16,
    pub(crate) body: Option<String>,
    pub(crate) headers: Vec<(String, HeaderValue)>,
}

impl Envelope {
    /// Serializes `value` as the body and uses `status` verbatim.
    pub fn json<T: Serialize + ?Sized>(value: &T, status: u16) -> Result<Self, Error> {
        let body = serde_json::to_string(value).map_err(Error::Serialize)?;
        Ok(Self { status, body: Some(body), headers: Vec::new() })
    }

    /// `{"msg":<msg>,"code":<code>}` with status `code`.
    pub fn error(msg: impl Into<String>, code: u16) -> Self {
        let body = ErrorBody { msg: msg.into(), code };
        Self::from_raw(code, error_body_text(&body))
    }

    /// `200 OK` with body `{"ok":true}`.
    pub fn ok() -> Self {
        Self::from_raw(200, r#"{"ok":true}"#.to_owned())
    }

    /// Wraps already-serialized JSON text. The caller vouches for the text.
    pub fn from_raw(status: u16, body: String) -> Self {
        Self { status, body: Some(body), headers: Vec::new() }
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn body(&self) -> Option<&str> { self.body.as_deref() }
    pub fn headers(&self) -> &[(String, HeaderValue)] { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Sets a header, replacing any existing value under the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<HeaderValue>) {
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, slot)) => *slot = value,
            None => self.headers.push((name.to_owned(), value)),
        }
    }

    /// Converts into an `http` response.
    ///
    /// Flag headers render as `true`/`false`. A `content-type` of
    /// `application/json` is added unless one is already set. Headers whose
    /// name or value is not valid HTTP are dropped with a warning.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let status = http::StatusCode::from_u16(self.status).unwrap_or_else(|_| {
            warn!(status = self.status, "status code out of range, sending 500");
            http::StatusCode::INTERNAL_SERVER_ERROR
        });

        let mut res = http::Response::new(Full::new(Bytes::from(self.body.unwrap_or_default())));
        *res.status_mut() = status;

        let headers = res.headers_mut();
        for (name, value) in &self.headers {
            let parsed = (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(&value.render()),
            );
            match parsed {
                (Ok(name), Ok(value)) => { headers.insert(name, value); }
                _ => warn!(header = %name, "dropping header that is not valid HTTP"),
            }
        }
        if !headers.contains_key(http::header::CONTENT_TYPE) {
            headers.insert(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            );
        }
        res
    }
}

/// Renders an [`ErrorBody`] without going through the fallible path: its two
/// fields always serialize.
fn error_body_text(body: &ErrorBody) -> String {
    serde_json::to_string(body).unwrap_or_else(|_| {
        format!(r#"{{"msg":"unhandled error","code":{}}}"#, body.code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusClass;
    use http_body_util::BodyExt;

    #[derive(Serialize)]
    struct Hello {
        message: &'static str,
    }

    #[test]
    fn json_uses_status_verbatim() {
        let env = Envelope::json(&Hello { message: "Hello, World!" }, 201).unwrap();
        assert_eq!(env.status(), 201);
        assert_eq!(env.body(), Some(r#"{"message":"Hello, World!"}"#));
        assert!(env.headers().is_empty());
    }

    #[test]
    fn error_shape() {
        let env = Envelope::error("invalid CORS origin: 'https://another.com'", 403);
        assert_eq!(env.status(), 403);
        assert_eq!(
            env.body(),
            Some(r#"{"msg":"invalid CORS origin: 'https://another.com'","code":403}"#),
        );
    }

    #[test]
    fn every_constructor_defines_status_and_body() {
        let built = [
            Envelope::json(&Hello { message: "hi" }, 200).unwrap(),
            Envelope::error("nope", 404),
            Envelope::ok(),
            Envelope::from_raw(204, String::new()),
        ];
        for env in built {
            assert!(StatusClass::of(env.status()).is_some(), "{env:?}");
            assert!(env.body().is_some(), "{env:?}");
        }
    }

    #[test]
    fn error_message_is_escaped() {
        let env = Envelope::error(r#"bad "quote""#, 400);
        assert_eq!(env.body(), Some(r#"{"msg":"bad \"quote\"","code":400}"#));
    }

    #[test]
    fn ok_shape() {
        let env = Envelope::ok();
        assert_eq!(env.status(), 200);
        assert_eq!(env.body(), Some(r#"{"ok":true}"#));
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut env = Envelope::ok();
        env.set_header("Access-Control-Allow-Origin", "https://a.com");
        env.set_header("access-control-allow-origin", "*");
        env.set_header("Access-Control-Allow-Credentials", true);

        assert_eq!(env.headers().len(), 2);
        assert_eq!(env.header("ACCESS-CONTROL-ALLOW-ORIGIN"), Some(&HeaderValue::from("*")));
        assert_eq!(env.header("access-control-allow-credentials"), Some(&HeaderValue::Flag(true)));
    }

    #[tokio::test]
    async fn into_http_renders_flags_and_content_type() {
        let mut env = Envelope::ok();
        env.set_header("Access-Control-Allow-Credentials", true);
        env.set_header("bad header", "x");

        let res = env.into_http();
        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(res.headers()["access-control-allow-credentials"], "true");
        assert_eq!(res.headers()["content-type"], "application/json");
        assert!(!res.headers().contains_key("bad header"));

        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }

    #[test]
    fn into_http_keeps_explicit_content_type() {
        let mut env = Envelope::ok();
        env.set_header("Content-Type", "application/problem+json");
        let res = env.into_http();
        assert_eq!(res.headers()["content-type"], "application/problem+json");
    }
}
