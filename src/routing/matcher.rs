//! Route matching logic.
//!
//! # Responsibilities
//! - Compile a `RouteCollection` into a method + path lookup structure
//! - Answer with exactly one of Matched / NotFound / MethodNotAllowed
//!
//! # Design Decisions
//! - Static paths are looked up in a HashMap before dynamic patterns are scanned
//! - Within each group, registration order decides (first registered wins)
//! - A path that exists under other methods is MethodNotAllowed, not NotFound
//! - HEAD falls back to GET when no route declares HEAD for the path
//! - Compiled once, immutable afterwards, shared across requests via `Arc`

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::error::RoutingError;
use crate::routing::pattern::{PathParams, PathPattern};
use crate::routing::route::{Route, RouteCollection};

/// Outcome of matching one request.
#[derive(Debug, Clone)]
pub enum MatchResult {
    Matched { route: Arc<Route>, params: PathParams },
    NotFound,
    MethodNotAllowed { allowed: Vec<Method> },
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

/// Adapter boundary over a routing engine.
pub trait RouteMatcher: Send + Sync + std::fmt::Debug {
    fn match_route(&self, method: &Method, path: &str) -> MatchResult;
}

/// Matcher over the built-in pattern grammar.
#[derive(Debug)]
pub struct PatternMatcher {
    routes: Vec<Arc<Route>>,
    static_paths: HashMap<String, Vec<usize>>,
    dynamic: Vec<(PathPattern, usize)>,
}

impl PatternMatcher {
    /// Compile every route of `collection`.
    pub fn compile(collection: &RouteCollection) -> Result<Self, RoutingError> {
        let mut static_paths: HashMap<String, Vec<usize>> = HashMap::new();
        let mut dynamic = Vec::new();

        for (index, route) in collection.routes().iter().enumerate() {
            let pattern = PathPattern::parse(route.path())?;
            if pattern.is_static() {
                static_paths.entry(route.path().to_string()).or_default().push(index);
            } else {
                dynamic.push((pattern, index));
            }
        }

        tracing::debug!(
            routes = collection.len(),
            static_routes = collection.len() - dynamic.len(),
            dynamic_routes = dynamic.len(),
            "Route table compiled"
        );

        Ok(Self {
            routes: collection.routes().to_vec(),
            static_paths,
            dynamic,
        })
    }

    /// Candidate routes for `path`, static first, each in registration order.
    fn candidates(&self, path: &str) -> Vec<(usize, PathParams)> {
        let mut found: Vec<(usize, PathParams)> = self
            .static_paths
            .get(path)
            .map(|indices| indices.iter().map(|&i| (i, PathParams::new())).collect())
            .unwrap_or_default();

        found.extend(
            self.dynamic
                .iter()
                .filter_map(|(pattern, index)| pattern.captures(path).map(|params| (*index, params))),
        );
        found
    }

    fn pick(&self, candidates: &[(usize, PathParams)], method: &Method) -> Option<MatchResult> {
        candidates
            .iter()
            .find(|(index, _)| self.routes[*index].allows(method))
            .map(|(index, params)| MatchResult::Matched {
                route: self.routes[*index].clone(),
                params: params.clone(),
            })
    }
}

impl RouteMatcher for PatternMatcher {
    fn match_route(&self, method: &Method, path: &str) -> MatchResult {
        let candidates = self.candidates(path);
        if candidates.is_empty() {
            return MatchResult::NotFound;
        }

        if let Some(matched) = self.pick(&candidates, method) {
            return matched;
        }
        if method == Method::HEAD {
            if let Some(matched) = self.pick(&candidates, &Method::GET) {
                return matched;
            }
        }

        let mut allowed: Vec<Method> = Vec::new();
        for (index, _) in &candidates {
            for m in self.routes[*index].methods() {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
        }
        MatchResult::MethodNotAllowed { allowed }
    }
}
