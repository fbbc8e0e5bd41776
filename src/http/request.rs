//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Capture the incoming request for one dispatch cycle
//! - Hold the parameter bag the router writes path parameters into
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is buffered before dispatch; handlers run synchronously
//! - HTTPS is detected from the URI scheme or `x-forwarded-proto`

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{request::Parts, HeaderMap, HeaderValue, Method, Uri, Version};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Name of the request ID header.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Named request parameters (path parameters after routing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBag {
    values: BTreeMap<String, String>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Extend<(String, String)> for ParameterBag {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

/// The incoming request for one dispatch cycle.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    params: ParameterBag,
}

impl Request {
    /// Create a bodyless request.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: ParameterBag::new(),
        }
    }

    /// Build from the parts of an HTTP request and its buffered body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            params: ParameterBag::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Requested resource as sent by the client (path and query).
    pub fn urn(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    pub fn is_https(&self) -> bool {
        if self.uri.scheme_str() == Some("https") {
            return true;
        }
        self.header("x-forwarded-proto")
            .map(|proto| proto.eq_ignore_ascii_case("https"))
            .unwrap_or(false)
    }

    /// `"https"` or `"http"`.
    pub fn scheme(&self) -> &'static str {
        if self.is_https() {
            "https"
        } else {
            "http"
        }
    }

    pub fn params(&self) -> &ParameterBag {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterBag {
        &mut self.params
    }

    /// Shorthand for `params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_detection() {
        let plain = Request::new(Method::GET, Uri::from_static("/"));
        assert!(!plain.is_https());
        assert_eq!(plain.scheme(), "http");

        let direct = Request::new(Method::GET, Uri::from_static("https://example.com/"));
        assert!(direct.is_https());

        let forwarded = Request::new(Method::GET, Uri::from_static("/"))
            .with_header("x-forwarded-proto", "HTTPS");
        assert_eq!(forwarded.scheme(), "https");
    }

    #[test]
    fn test_urn_keeps_query() {
        let req = Request::new(Method::GET, Uri::from_static("/search?q=rust"));
        assert_eq!(req.path(), "/search");
        assert_eq!(req.urn(), "/search?q=rust");
    }

    #[test]
    fn test_parameter_bag() {
        let mut req = Request::new(Method::GET, Uri::from_static("/users/42"));
        assert!(req.params().is_empty());
        req.params_mut()
            .extend([("id".to_string(), "42".to_string())]);
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.params().len(), 1);
    }
}
