//! Per-request routing.
//!
//! # Responsibilities
//! - Ask the matcher for a route for the current request
//! - Record the routing outcome (write-once per request cycle)
//! - Write path parameters into the request before any handler runs
//! - Expose the matched handler identity to downstream layers
//!
//! # State Transitions
//! ```text
//! Unrouted → Routed { identity }   (Matched)
//! Unrouted → Failed                (NotFound / MethodNotAllowed)
//! ```
//! Both end states are terminal; a router serves exactly one request.

use std::sync::Arc;

use crate::error::DispatchError;
use crate::http::Request;
use crate::routing::matcher::{MatchResult, RouteMatcher};
use crate::routing::pattern::PathParams;
use crate::routing::route::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingState {
    Unrouted,
    Routed { identity: String },
    Failed,
}

#[derive(Debug)]
pub struct Router {
    matcher: Arc<dyn RouteMatcher>,
    state: RoutingState,
    outcome: Option<MatchResult>,
}

impl Router {
    pub fn new(matcher: Arc<dyn RouteMatcher>) -> Self {
        Self {
            matcher,
            state: RoutingState::Unrouted,
            outcome: None,
        }
    }

    /// Match `request` and record the outcome.
    ///
    /// The first call decides; later calls return the cached result and
    /// leave the request untouched.
    pub fn route(&mut self, request: &mut Request) -> MatchResult {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let result = self.matcher.match_route(request.method(), request.path());
        match &result {
            MatchResult::Matched { route, params } => {
                request
                    .params_mut()
                    .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
                let identity = route.handler().identity().to_string();
                tracing::debug!(
                    method = %request.method(),
                    path = %request.path(),
                    handler = %identity,
                    "Route matched"
                );
                self.state = RoutingState::Routed { identity };
            }
            MatchResult::NotFound => {
                tracing::debug!(method = %request.method(), path = %request.path(), "No route matched");
                self.state = RoutingState::Failed;
            }
            MatchResult::MethodNotAllowed { allowed } => {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.path(),
                    allowed = ?allowed,
                    "Method not allowed for path"
                );
                self.state = RoutingState::Failed;
            }
        }

        self.outcome = Some(result.clone());
        result
    }

    pub fn has_routed(&self) -> bool {
        matches!(self.state, RoutingState::Routed { .. })
    }

    pub fn state(&self) -> &RoutingState {
        &self.state
    }

    /// The matched route and its parameters, if any.
    pub fn matched(&self) -> Option<(&Arc<Route>, &PathParams)> {
        match &self.outcome {
            Some(MatchResult::Matched { route, params }) => Some((route, params)),
            _ => None,
        }
    }

    /// Identity of the matched handler.
    ///
    /// When nothing matched: an error if `throw_if_unset`, otherwise `""`.
    pub fn controller(&self, throw_if_unset: bool) -> Result<String, DispatchError> {
        match &self.state {
            RoutingState::Routed { identity } => Ok(identity.clone()),
            _ if throw_if_unset => Err(DispatchError::no_route(
                "No controller has been resolved for the current request",
            )),
            _ => Ok(String::new()),
        }
    }
}
