//! Route definitions.
//!
//! # Responsibilities
//! - Represent a (methods, path pattern, handler) triple
//! - Keep routes in registration order for matcher compilation
//! - Flag ambiguous registrations instead of resolving them silently
//!
//! # Design Decisions
//! - Routes are immutable once added and shared via `Arc`
//! - Ambiguity rule: the first registered route wins; later ones are
//!   recorded as `RouteConflict`s and logged

use std::sync::Arc;

use axum::http::Method;

use crate::resolver::HandlerRef;
use crate::routing::pattern::PathPattern;

const STANDARD_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// A declared (methods, path, handler) triple.
#[derive(Debug, Clone)]
pub struct Route {
    methods: Vec<Method>,
    path: String,
    shape: String,
    handler: HandlerRef,
}

impl Route {
    pub fn new(
        methods: impl IntoIterator<Item = Method>,
        path: impl Into<String>,
        handler: impl Into<HandlerRef>,
    ) -> Self {
        let mut unique: Vec<Method> = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        let path = path.into();
        // Invalid patterns are rejected when the matcher compiles.
        let shape = PathPattern::parse(&path)
            .map(|pattern| pattern.shape().to_string())
            .unwrap_or_else(|_| path.clone());
        Self {
            methods: unique,
            path,
            shape,
            handler: handler.into(),
        }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

/// A later route shadowed by an earlier one that matches the same paths
/// (parameter names aside) with an overlapping method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    pub path: String,
    pub methods: Vec<Method>,
    /// Index of the route that wins.
    pub kept: usize,
    /// Index of the shadowed route.
    pub shadowed: usize,
}

/// Insertion-ordered route table.
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<Arc<Route>>,
    conflicts: Vec<RouteConflict>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route.
    pub fn add(
        &mut self,
        methods: impl IntoIterator<Item = Method>,
        path: impl Into<String>,
        handler: impl Into<HandlerRef>,
    ) -> &mut Self {
        let route = Route::new(methods, path, handler);
        let index = self.routes.len();

        if let Some((kept, existing)) = self
            .routes
            .iter()
            .enumerate()
            .find(|(_, r)| r.shape == route.shape && r.methods.iter().any(|m| route.allows(m)))
        {
            let overlap: Vec<Method> = existing
                .methods
                .iter()
                .filter(|m| route.allows(m))
                .cloned()
                .collect();
            tracing::warn!(
                path = %route.path,
                methods = ?overlap,
                kept = existing.handler.identity(),
                shadowed = route.handler.identity(),
                "Route shadowed by an earlier registration; first registered wins"
            );
            self.conflicts.push(RouteConflict {
                path: route.path.clone(),
                methods: overlap,
                kept,
                shadowed: index,
            });
        }

        self.routes.push(Arc::new(route));
        self
    }

    pub fn get(&mut self, path: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.add([Method::GET], path, handler)
    }

    pub fn post(&mut self, path: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.add([Method::POST], path, handler)
    }

    pub fn put(&mut self, path: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.add([Method::PUT], path, handler)
    }

    pub fn patch(&mut self, path: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.add([Method::PATCH], path, handler)
    }

    pub fn delete(&mut self, path: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.add([Method::DELETE], path, handler)
    }

    /// Route answering every standard method.
    pub fn any(&mut self, path: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.add(STANDARD_METHODS, path, handler)
    }

    /// All routes in registration order, for matcher compilation.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn conflicts(&self) -> &[RouteConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_order() {
        let mut routes = RouteCollection::new();
        routes.get("/", "home").post("/users", "users->create").get("/users/{id}", "users->show");

        let paths: Vec<&str> = routes.routes().iter().map(|r| r.path()).collect();
        assert_eq!(paths, ["/", "/users", "/users/{id}"]);
        assert!(routes.conflicts().is_empty());
    }

    #[test]
    fn test_methods_deduplicated() {
        let route = Route::new([Method::GET, Method::GET, Method::POST], "/", "home");
        assert_eq!(route.methods(), [Method::GET, Method::POST]);
        assert!(route.allows(&Method::POST));
        assert!(!route.allows(&Method::DELETE));
    }

    #[test]
    fn test_conflict_flagged() {
        let mut routes = RouteCollection::new();
        routes
            .add([Method::GET, Method::POST], "/login", "first")
            .add([Method::POST], "/login", "second")
            .add([Method::DELETE], "/login", "third");

        assert_eq!(
            routes.conflicts(),
            [RouteConflict {
                path: "/login".into(),
                methods: vec![Method::POST],
                kept: 0,
                shadowed: 1,
            }]
        );
        assert_eq!(routes.len(), 3);
    }

    #[test]
    fn test_conflict_flagged_across_parameter_names() {
        let mut routes = RouteCollection::new();
        routes
            .get("/users/{id}", "users->show")
            .get("/users/{uid}", "accounts->show")
            .get("/users/{id:[0-9]+}", "users->numeric");

        assert_eq!(
            routes.conflicts(),
            [RouteConflict {
                path: "/users/{uid}".into(),
                methods: vec![Method::GET],
                kept: 0,
                shadowed: 1,
            }]
        );
    }
}
