//! Error taxonomy for the request lifecycle.
//!
//! # Design Decisions
//! - Every failure that can escape dispatch is a `DispatchError`
//! - Only the failure funnel turns a `DispatchError` into a status code
//! - `NoRoute` is the single variant that maps to 404; everything else is 500

use thiserror::Error;

use crate::container::ContainerError;

/// Error raised by application handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can escape `Application::dispatch` / `Application::finish`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No route matched the request (also used for method-not-allowed).
    #[error("{message}")]
    NoRoute { message: String },

    /// The matched handler reference could not be turned into a handler.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The handler ran and returned an error.
    #[error("handler `{handler}` failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: HandlerError,
    },

    /// A service lookup failed outside of handler resolution.
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    InvalidValue(#[from] InvalidValueError),

    /// The cycle was already terminated by the failure funnel.
    #[error("the request cycle has already terminated")]
    Terminated,
}

impl DispatchError {
    /// Create a no-route error with the given message.
    pub fn no_route(message: impl Into<String>) -> Self {
        DispatchError::NoRoute {
            message: message.into(),
        }
    }

    /// Returns true for failures that translate to 404.
    pub fn is_no_route(&self) -> bool {
        matches!(self, DispatchError::NoRoute { .. })
    }
}

/// Failure to turn a `HandlerRef` into a callable handler.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no service is registered under `{key}`")]
    MissingKey { key: String },

    #[error("service `{key}` is not a handler")]
    NotInvocable { key: String },

    #[error("controller `{service}` has no action `{action}`")]
    UnknownAction { service: String, action: String },

    #[error("handler reference `{0}` is malformed")]
    Malformed(String),

    #[error(transparent)]
    Container(ContainerError),
}

/// A caller supplied a value outside of the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidValueError {
    #[error("{0} is not a valid compare method. Please try: >, >=, <, <=, == or !=.")]
    CompareOperator(String),

    #[error("`{0}` is not a valid debug level. Please try: dev, test, beta or prod.")]
    DebugLevel(String),
}

/// Route table compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_route_classification() {
        assert!(DispatchError::no_route("missing").is_no_route());
        assert!(!DispatchError::Terminated.is_no_route());
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let err = DispatchError::Handler {
            handler: "Users::show".into(),
            source: "database offline".into(),
        };
        assert_eq!(err.to_string(), "handler `Users::show` failed: database offline");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_compare_operator_message_names_operator() {
        let err = InvalidValueError::CompareOperator("~=".into());
        assert!(err.to_string().starts_with("~= is not a valid compare method"));
    }
}
