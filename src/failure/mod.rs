//! Failure capture and translation.
//!
//! # Data Flow
//! ```text
//! Err(DispatchError) escaping dispatch/finish ──┐
//! panic inside application code ────────────────┼─→ FailureEnvelope → translate() → (status, body)
//! undrained panic record at shutdown ───────────┘
//! ```
//!
//! # Design Decisions
//! - One envelope shape for every entry point
//! - One translation routine; status is decided only here
//! - Translation is guarded: a panicking renderer falls back to a static page

pub mod interception;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use axum::http::StatusCode;
use html_escape::encode_text;

use crate::controller::ErrorRenderer;
use crate::error::DispatchError;
use crate::view::ExceptionView;

pub use interception::{Interceptor, PanicRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    RouteNotFound,
    RuntimeFailure,
}

impl FailureKind {
    pub fn status(self) -> StatusCode {
        match self {
            FailureKind::RouteNotFound => StatusCode::NOT_FOUND,
            FailureKind::RuntimeFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::RouteNotFound => "route_not_found",
            FailureKind::RuntimeFailure => "runtime_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A captured failure, consumed once by [`translate`].
#[derive(Debug, Clone)]
pub struct FailureEnvelope {
    pub kind: FailureKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub cause: Option<String>,
    pub backtrace: Option<String>,
}

impl FailureEnvelope {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RuntimeFailure,
            message: message.into(),
            location: None,
            cause: None,
            backtrace: None,
        }
    }

    /// Envelope for an error returned from dispatch.
    ///
    /// A no-route error anywhere in the source chain (for example one a
    /// handler returned) makes the envelope a 404.
    pub fn from_error(err: &DispatchError) -> Self {
        if err.is_no_route() {
            return Self::not_found(err.to_string());
        }

        let mut causes = Vec::new();
        let mut source = std::error::Error::source(err);
        while let Some(inner) = source {
            if let Some(nested) = inner.downcast_ref::<DispatchError>() {
                if nested.is_no_route() {
                    // Handler text is not trusted to be HTML-safe.
                    return Self::not_found(encode_text(&nested.to_string()).into_owned());
                }
            }
            causes.push(inner.to_string());
            source = inner.source();
        }

        Self {
            kind: FailureKind::RuntimeFailure,
            message: err.to_string(),
            location: None,
            cause: (!causes.is_empty()).then(|| causes.join(": ")),
            backtrace: None,
        }
    }

    fn not_found(message: String) -> Self {
        Self {
            kind: FailureKind::RouteNotFound,
            message,
            location: None,
            cause: None,
            backtrace: None,
        }
    }

    /// Envelope for a recorded panic.
    pub fn from_panic(record: PanicRecord) -> Self {
        Self {
            kind: FailureKind::RuntimeFailure,
            message: match &record.location {
                Some(loc) => format!("{} in {} on line {}.", record.message, loc.file, loc.line),
                None => record.message.clone(),
            },
            location: record.location,
            cause: None,
            backtrace: record.backtrace,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

/// Static page used when the renderer itself fails.
pub const FALLBACK_BODY: &str = "<!DOCTYPE html><html><head><title>There was an Error!</title></head>\
<body><h1>There was an Error!</h1><p>Your request could not be completed because there was an error.</p></body></html>";

/// The single failure → response translation.
pub fn translate(failure: &FailureEnvelope, renderer: &dyn ErrorRenderer) -> (StatusCode, String) {
    let status = failure.status();
    let rendered = interception::silenced(|| {
        panic::catch_unwind(AssertUnwindSafe(|| match failure.kind {
            FailureKind::RouteNotFound => renderer.not_found(failure),
            FailureKind::RuntimeFailure => renderer.internal_error(failure),
        }))
    });

    let body = match rendered {
        Ok(body) => body,
        Err(_) => {
            tracing::error!(status = %status, "Error renderer panicked; using fallback page");
            match failure.kind {
                FailureKind::RouteNotFound => ExceptionView::render404("", false),
                FailureKind::RuntimeFailure => FALLBACK_BODY.to_string(),
            }
        }
    };
    (status, body)
}
