//! Response handling.
//!
//! # Responsibilities
//! - Accumulate status, headers and body during dispatch
//! - Flush exactly once (`send`) when the cycle completes
//! - Convert into an axum response for the transport
//!
//! # Design Decisions
//! - `send` is the single flush point; calling it twice is a caller bug and is logged
//! - The request ID is echoed on every response, including error pages

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Version};
use axum::response::IntoResponse;

use crate::http::request::{Request, X_REQUEST_ID};

const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Outgoing response for one dispatch cycle.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: String,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        Self {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers,
            body: String::new(),
            sent: false,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response bound to `request`: same protocol version, request ID echoed.
    pub fn for_request(request: &Request) -> Self {
        let mut response = Self {
            version: request.version(),
            ..Self::default()
        };
        if let Some(id) = request.headers().get(X_REQUEST_ID) {
            response.headers.insert(X_REQUEST_ID, id.clone());
        }
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn append_body(&mut self, chunk: &str) -> &mut Self {
        self.body.push_str(chunk);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header; invalid values are dropped with a warning.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> &mut Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %name, "Dropping invalid header value"),
        }
        self
    }

    /// Mark the response as flushed.
    ///
    /// Must be called once per cycle.
    pub fn send(&mut self) {
        if self.sent {
            tracing::warn!(status = %self.status, "Response sent twice");
            return;
        }
        self.sent = true;
        tracing::debug!(status = %self.status, bytes = self.body.len(), "Response sent");
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Convert into an axum response.
    pub fn into_http(self) -> axum::response::Response {
        let mut response = (self.status, Body::from(self.body)).into_response();
        *response.version_mut() = self.version;
        response.headers_mut().extend(self.headers);
        response
    }
}
