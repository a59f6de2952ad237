//! Incoming request type.
//!
//! The pipeline only ever looks at three things: the `Origin` header, the raw
//! body, and the dispatch context (method and path) used for logging. The
//! rest of the headers ride along so business handlers can read them through
//! [`ApiContext`](crate::ApiContext).

use bytes::Bytes;

/// Method and path of the request, as reported by whatever dispatched it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Dispatch {
    pub(crate) method: String,
    pub(crate) path: String,
}

impl Dispatch {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self { method: method.into(), path: path.into() }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
}

/// An incoming request. Read-only to every layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<String>,
    pub(crate) dispatch: Option<Dispatch>,
}

impl Request {
    /// An empty request: no headers, no body, no dispatch context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_dispatch(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.dispatch = Some(Dispatch::new(method, path));
        self
    }

    /// Converts an `http` request. Non-UTF-8 header values are dropped; an
    /// empty or non-UTF-8 body is treated as absent.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();

        let headers = parts.headers.iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        let body = if body.is_empty() {
            None
        } else {
            String::from_utf8(body.to_vec()).ok()
        };

        Self {
            headers,
            body,
            dispatch: Some(Dispatch::new(parts.method.as_str(), parts.uri.path())),
        }
    }

    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> Option<&str> { self.body.as_deref() }
    pub fn dispatch(&self) -> Option<&Dispatch> { self.dispatch.as_ref() }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Origin` header, if the caller sent one.
    pub fn origin(&self) -> Option<&str> {
        self.header("origin")
    }

    /// Dispatch method, or `""` when no dispatch context was supplied.
    pub fn method(&self) -> &str {
        self.dispatch.as_ref().map_or("", |d| d.method.as_str())
    }

    /// Dispatch path, or `""` when no dispatch context was supplied.
    pub fn path(&self) -> &str {
        self.dispatch.as_ref().map_or("", |d| d.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_lookup_ignores_case() {
        let req = Request::new().with_header("Origin", "https://example.com");
        assert_eq!(req.origin(), Some("https://example.com"));

        let req = Request::new().with_header("origin", "https://example.com");
        assert_eq!(req.origin(), Some("https://example.com"));

        assert_eq!(Request::new().origin(), None);
    }

    #[test]
    fn missing_dispatch_reads_as_empty() {
        let req = Request::new();
        assert_eq!(req.method(), "");
        assert_eq!(req.path(), "");

        let req = req.with_dispatch("POST", "/greet");
        assert_eq!(req.method(), "POST");
        assert_eq!(req.path(), "/greet");
    }

    #[test]
    fn from_http_captures_headers_body_and_dispatch() {
        let req = http::Request::builder()
            .method("POST")
            .uri("https://api.example.com/greet?lang=en")
            .header("origin", "https://example.com")
            .body(Bytes::from_static(br#"{"first":"Keith"}"#))
            .unwrap();

        let req = Request::from_http(req);
        assert_eq!(req.origin(), Some("https://example.com"));
        assert_eq!(req.body(), Some(r#"{"first":"Keith"}"#));
        assert_eq!(req.method(), "POST");
        assert_eq!(req.path(), "/greet");
    }

    #[test]
    fn from_http_treats_empty_and_binary_bodies_as_absent() {
        let empty = http::Request::builder().uri("/").body(Bytes::new()).unwrap();
        assert_eq!(Request::from_http(empty).body(), None);

        let binary = http::Request::builder()
            .uri("/")
            .body(Bytes::from_static(&[0xff, 0xfe, 0x00]))
            .unwrap();
        assert_eq!(Request::from_http(binary).body(), None);
    }
}
