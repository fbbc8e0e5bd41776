//! Maverick: a request-dispatch core for server-rendered web applications.
//!
//! One request, one [`Application`]: build a fresh service container, route
//! the request, resolve and invoke the handler, send the response. Every
//! failure along the way is funnelled into a single translation that emits
//! exactly one error page.

// Dispatch core
pub mod app;
pub mod container;
pub mod resolver;
pub mod routing;

// Failure handling and rendering
pub mod controller;
pub mod error;
pub mod failure;
pub mod output;
pub mod view;

// Transport and cross-cutting concerns
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use app::{AppOptions, Application, DebugLevel};
pub use config::AppConfig;
pub use container::{Container, ContainerError};
pub use error::{DispatchError, HandlerError};
pub use http::{HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use resolver::{ActionTable, Context, Controller, Handler, HandlerRef};
pub use routing::{PatternMatcher, RouteCollection};
