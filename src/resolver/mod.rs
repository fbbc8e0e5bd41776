//! Handler references and their resolution.
//!
//! # Data Flow
//! ```text
//! Route.handler (HandlerRef)
//!     → Invocable(handler)        → returned unchanged
//!     → LookupKey("key")          → container.get("key") → Handler
//!     → LookupKey("svc->action")  → container.get("svc") → Controller::action("action")
//! ```
//!
//! # Design Decisions
//! - Closed set of reference kinds; no reflection-style dispatch
//! - No caching here: the container already memoizes services
//! - A missing key is an error, never a silent default

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::container::{Container, ContainerError};
use crate::error::{HandlerError, ResolutionError};
use crate::http::{Request, Response, Session};
use crate::output::Output;

/// Result returned by every handler.
pub type HandlerResult = Result<(), HandlerError>;

type HandlerFn = dyn Fn(&mut Context<'_>) -> HandlerResult + Send + Sync;

/// Everything a handler may touch while it runs.
///
/// The request, response and session are already borrowed from the
/// application for the duration of the call; reach them through the context,
/// not through the container.
pub struct Context<'a> {
    pub request: &'a Request,
    pub response: &'a mut Response,
    pub session: &'a mut Session,
    pub output: &'a mut Output,
    pub services: &'a Container,
}

impl Context<'_> {
    /// Path parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    /// Path parameter by name, as an error when absent.
    pub fn require_param(&self, name: &str) -> Result<&str, HandlerError> {
        self.param(name)
            .ok_or_else(|| format!("missing path parameter `{}`", name).into())
    }
}

/// A named, shareable request handler.
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    func: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            func: Arc::new(func),
        }
    }

    /// Identity used for logging and page-asset discovery.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &mut Context<'_>) -> HandlerResult {
        (self.func)(ctx)
    }

    /// True when both values share the same underlying closure.
    pub fn same_as(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

/// Reference to request-handling logic attached to a route.
#[derive(Debug, Clone)]
pub enum HandlerRef {
    /// Directly callable handler.
    Invocable(Handler),
    /// Container key, optionally `"service->action"`.
    LookupKey(String),
}

impl HandlerRef {
    pub fn key(key: impl Into<String>) -> Self {
        HandlerRef::LookupKey(key.into())
    }

    /// Identity string of the referenced handler.
    pub fn identity(&self) -> &str {
        match self {
            HandlerRef::Invocable(handler) => handler.name(),
            HandlerRef::LookupKey(key) => key,
        }
    }
}

impl From<Handler> for HandlerRef {
    fn from(handler: Handler) -> Self {
        HandlerRef::Invocable(handler)
    }
}

impl From<&str> for HandlerRef {
    fn from(key: &str) -> Self {
        HandlerRef::LookupKey(key.to_string())
    }
}

/// A service exposing named actions, addressed as `"service->action"`.
pub trait Controller: Send + Sync {
    fn action(&self, name: &str) -> Option<Handler>;
}

/// Controller backed by a name → handler table.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    actions: HashMap<String, Handler>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action; the handler is named `"<prefix>::<action>"`.
    pub fn action<F>(mut self, prefix: &str, name: &str, func: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = Handler::new(format!("{}::{}", prefix, name), func);
        self.actions.insert(name.to_string(), handler);
        self
    }
}

impl Controller for ActionTable {
    fn action(&self, name: &str) -> Option<Handler> {
        self.actions.get(name).cloned()
    }
}

/// Turns `HandlerRef`s into handlers against one container.
#[derive(Debug, Clone, Copy)]
pub struct HandlerResolver<'c> {
    container: &'c Container,
}

impl<'c> HandlerResolver<'c> {
    pub fn new(container: &'c Container) -> Self {
        Self { container }
    }

    pub fn resolve(&self, reference: &HandlerRef) -> Result<Handler, ResolutionError> {
        match reference {
            HandlerRef::Invocable(handler) => Ok(handler.clone()),
            HandlerRef::LookupKey(key) => match key.split_once("->") {
                Some((service, action)) => self.resolve_action(key, service.trim(), action.trim()),
                None => self.resolve_key(key),
            },
        }
    }

    fn resolve_key(&self, key: &str) -> Result<Handler, ResolutionError> {
        if !self.container.has(key) {
            return Err(ResolutionError::MissingKey {
                key: key.to_string(),
            });
        }
        match self.container.get_as::<Handler>(key) {
            Ok(handler) => Ok(Handler::clone(&handler)),
            Err(ContainerError::TypeMismatch { .. }) => Err(ResolutionError::NotInvocable {
                key: key.to_string(),
            }),
            Err(err) => Err(ResolutionError::Container(err)),
        }
    }

    fn resolve_action(&self, raw: &str, service: &str, action: &str) -> Result<Handler, ResolutionError> {
        if service.is_empty() || action.is_empty() {
            return Err(ResolutionError::Malformed(raw.to_string()));
        }
        if !self.container.has(service) {
            return Err(ResolutionError::MissingKey {
                key: service.to_string(),
            });
        }
        let controller = match self.container.get_as::<Arc<dyn Controller>>(service) {
            Ok(controller) => controller,
            Err(ContainerError::TypeMismatch { .. }) => {
                return Err(ResolutionError::NotInvocable {
                    key: service.to_string(),
                })
            }
            Err(err) => return Err(ResolutionError::Container(err)),
        };
        controller
            .action(action)
            .ok_or_else(|| ResolutionError::UnknownAction {
                service: service.to_string(),
                action: action.to_string(),
            })
    }
}
