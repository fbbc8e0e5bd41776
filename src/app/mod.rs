//! Application orchestration.
//!
//! # Data Flow
//! ```text
//! Application::new
//!     → install interception (before anything fallible)
//!     → fresh container + default services + application providers
//!     → resolve request, response, router, session, exception controller
//! Application::dispatch
//!     → router.route (params written into the request)
//!     → page assets → HandlerResolver.resolve → handler.call(Context)
//! Application::finish
//!     → not routed: NoRoute error  |  routed: response.send()
//!
//! Failures:
//!     Err from dispatch/finish ─┐
//!     panic (guard)            ─┼─→ on_failure → translate → send → Terminated
//!     pending panic at shutdown ┘
//! ```
//!
//! # Design Decisions
//! - One Application per request cycle; no per-request state outside it
//! - Translation fires at most once (one-shot guard in the Interceptor)
//! - Once terminated, no further application code runs

pub mod debug;
pub mod services;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use html_escape::encode_quoted_attribute;

use crate::config::{AppConfig, DebugConfig, OutputConfig};
use crate::container::{Container, ContainerError};
use crate::controller::{ErrorRenderer, ExceptionController};
use crate::error::{DispatchError, InvalidValueError};
use crate::failure::{self, interception, FailureEnvelope, FailureKind, Interceptor};
use crate::http::{Request, Response, Session};
use crate::observability::metrics;
use crate::output::Output;
use crate::resolver::{Context, HandlerResolver};
use crate::routing::{MatchResult, RouteMatcher, Router};

pub use debug::{CompareOp, DebugLevel};

/// A service shared between the container and the application.
pub type Shared<T> = Arc<Mutex<T>>;

/// Lock a shared handle, recovering from poisoning.
///
/// A handler that panics while holding a handle poisons it; the failure path
/// still has to reach the response afterwards.
pub fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

type Provider = Arc<dyn Fn(&Container) -> Result<(), ContainerError> + Send + Sync>;

/// Everything needed to build an Application for one request.
///
/// Cheap to clone; the matcher and providers are shared read-only.
#[derive(Clone)]
pub struct AppOptions {
    pub debug_level: DebugLevel,
    pub detail_threshold: DebugLevel,
    pub matcher: Arc<dyn RouteMatcher>,
    pub output: OutputConfig,
    providers: Vec<Provider>,
}

impl AppOptions {
    pub fn new(matcher: Arc<dyn RouteMatcher>) -> Self {
        let debug = DebugConfig::default();
        Self {
            debug_level: debug.level,
            detail_threshold: debug.detail_threshold,
            matcher,
            output: OutputConfig::default(),
            providers: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig, matcher: Arc<dyn RouteMatcher>) -> Self {
        Self {
            debug_level: config.debug.level,
            detail_threshold: config.debug.detail_threshold,
            output: config.output.clone(),
            ..Self::new(matcher)
        }
    }

    pub fn with_debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Add a provider that registers application services into every
    /// fresh container, after the defaults.
    pub fn with_services<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Container) -> Result<(), ContainerError> + Send + Sync + 'static,
    {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Whether error pages include diagnostic detail.
    pub fn show_detail(&self) -> bool {
        self.debug_level
            .compare("<=", self.detail_threshold)
            .unwrap_or(false)
    }
}

impl fmt::Debug for AppOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppOptions")
            .field("debug_level", &self.debug_level)
            .field("detail_threshold", &self.detail_threshold)
            .field("matcher", &self.matcher)
            .field("providers", &self.providers.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Sent,
    Terminated,
}

/// One request-handling cycle.
pub struct Application {
    debug_level: DebugLevel,
    interceptor: Interceptor,
    services: Container,
    request: Shared<Request>,
    response: Shared<Response>,
    router: Shared<Router>,
    session: Shared<Session>,
    errors: Arc<dyn ErrorRenderer>,
    output: Output,
    dispatched: bool,
    phase: Phase,
}

impl Application {
    /// Build the application for `request`.
    ///
    /// A panicking provider becomes a `FactoryFailed` error. Panics elsewhere
    /// during construction propagate; [`Application::handle`] guards those.
    pub fn new(options: AppOptions, request: Request) -> Result<Self, DispatchError> {
        let interceptor = Interceptor::install();

        let services = Container::new();
        services::register_defaults(&services, &options, request)?;
        for (index, provider) in options.providers.iter().enumerate() {
            interception::guard(|| provider(&services)).map_err(|envelope| {
                ContainerError::FactoryFailed {
                    key: format!("provider #{}", index),
                    reason: envelope.message,
                }
            })??;
        }

        let request = services.get_as::<Mutex<Request>>(services::REQUEST)?;
        let response = services.get_as::<Mutex<Response>>(services::RESPONSE)?;
        let router = services.get_as::<Mutex<Router>>(services::ROUTER)?;
        let session = services.get_as::<Mutex<Session>>(services::SESSION)?;
        let errors = services
            .get_as::<Arc<dyn ErrorRenderer>>(services::EXCEPTION_CONTROLLER)?
            .as_ref()
            .clone();

        Ok(Self {
            debug_level: options.debug_level,
            interceptor,
            services,
            request,
            response,
            router,
            session,
            errors,
            output: Output::new(options.output),
            dispatched: false,
            phase: Phase::Running,
        })
    }

    /// Run one full cycle for `request`, always producing a response.
    pub fn handle(options: AppOptions, request: Request) -> Response {
        let template = Response::for_request(&request);
        let show_detail = options.show_detail();

        let booted = interception::guard(|| Application::new(options, request));
        let envelope = match booted {
            Ok(Ok(mut app)) => {
                app.run();
                return app.take_response();
            }
            Ok(Err(err)) => FailureEnvelope::from_error(&err),
            Err(envelope) => envelope,
        };

        tracing::error!(message = %envelope.message, "Application construction failed");
        metrics::record_failure(envelope.kind);
        let (status, body) = failure::translate(&envelope, &ExceptionController::new(show_detail));
        let mut response = template;
        response.set_status(status).set_body(body);
        response.send();
        response
    }

    /// Dispatch and finish, funnelling any failure into the translation.
    pub fn run(&mut self) {
        let outcome = interception::guard(|| {
            self.dispatch()?;
            self.finish()
        });
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.on_error(err),
            Err(envelope) => self.on_failure(envelope),
        }
    }

    /// Match the request and invoke the resolved handler.
    ///
    /// An unmatched request is not an error here; `finish` decides.
    pub fn dispatch(&mut self) -> Result<(), DispatchError> {
        self.ensure_running()?;
        if self.dispatched {
            tracing::warn!("dispatch called twice; ignoring");
            return Ok(());
        }
        self.dispatched = true;

        let outcome = {
            let mut request = lock(&self.request);
            lock(&self.router).route(&mut request)
        };
        let route = match outcome {
            MatchResult::Matched { route, .. } => route,
            MatchResult::NotFound | MatchResult::MethodNotAllowed { .. } => return Ok(()),
        };

        self.output.collect_page_assets(&lock(&self.router))?;
        let handler = HandlerResolver::new(&self.services).resolve(route.handler())?;

        let request = lock(&self.request);
        let mut response = lock(&self.response);
        let mut session = lock(&self.session);
        tracing::debug!(
            request_id = request.request_id().unwrap_or("-"),
            handler = handler.name(),
            "Invoking handler"
        );

        let mut ctx = Context {
            request: &request,
            response: &mut response,
            session: &mut session,
            output: &mut self.output,
            services: &self.services,
        };
        handler
            .call(&mut ctx)
            .map_err(|source| DispatchError::Handler {
                handler: handler.name().to_string(),
                source,
            })
    }

    /// Decide whether the request was handled and send the response.
    pub fn finish(&mut self) -> Result<(), DispatchError> {
        self.ensure_running()?;

        if !lock(&self.router).has_routed() {
            let request = lock(&self.request);
            return Err(DispatchError::no_route(format!(
                "No route exists for {} using method {} and {}",
                encode_quoted_attribute(request.urn()),
                encode_quoted_attribute(request.method().as_str()),
                request.scheme()
            )));
        }

        lock(&self.response).send();
        self.phase = Phase::Sent;
        Ok(())
    }

    /// Exit handler: translate a panic record that was never drained.
    ///
    /// Runs from `Drop` as well; calling it more than once is harmless.
    pub fn shutdown(&mut self) {
        let Some(record) = interception::take_pending() else {
            return;
        };
        if self.phase == Phase::Sent || self.interceptor.has_translated() {
            tracing::debug!(message = %record.message, "Discarding panic record after completed cycle");
            return;
        }
        self.on_failure(FailureEnvelope::from_panic(record));
    }

    fn on_error(&mut self, err: DispatchError) {
        if let DispatchError::Terminated = err {
            tracing::debug!("Cycle already terminated");
            return;
        }
        self.on_failure(FailureEnvelope::from_error(&err));
    }

    /// The failure funnel. Every entry point ends here.
    fn on_failure(&mut self, envelope: FailureEnvelope) {
        if !self.interceptor.claim() {
            tracing::debug!(message = %envelope.message, "Failure already translated; ignoring");
            return;
        }

        let request = lock(&self.request);
        match envelope.kind {
            FailureKind::RouteNotFound => tracing::info!(
                request_id = request.request_id().unwrap_or("-"),
                method = %request.method(),
                path = %request.path(),
                "No route for request"
            ),
            FailureKind::RuntimeFailure => tracing::error!(
                request_id = request.request_id().unwrap_or("-"),
                method = %request.method(),
                path = %request.path(),
                message = %envelope.message,
                cause = envelope.cause.as_deref().unwrap_or("-"),
                "Request failed"
            ),
        }
        metrics::record_failure(envelope.kind);

        let (status, body) = failure::translate(&envelope, self.errors.as_ref());
        let mut response = Response::for_request(&request);
        response.set_status(status).set_body(body);
        response.send();
        drop(request);

        *lock(&self.response) = response;
        self.phase = Phase::Terminated;
    }

    fn ensure_running(&self) -> Result<(), DispatchError> {
        match self.phase {
            Phase::Terminated => Err(DispatchError::Terminated),
            Phase::Running | Phase::Sent => Ok(()),
        }
    }

    /// Run the exit handler and hand the response to the transport.
    pub fn take_response(&mut self) -> Response {
        self.shutdown();
        std::mem::take(&mut *lock(&self.response))
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.debug_level
    }

    /// Compare the current debug level: `current <op> other`.
    pub fn debug_compare(&self, op: &str, other: DebugLevel) -> Result<bool, InvalidValueError> {
        self.debug_level.compare(op, other)
    }

    pub fn request(&self) -> MutexGuard<'_, Request> {
        lock(&self.request)
    }

    pub fn response(&self) -> MutexGuard<'_, Response> {
        lock(&self.response)
    }

    pub fn router(&self) -> MutexGuard<'_, Router> {
        lock(&self.router)
    }

    pub fn session(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }

    pub fn services(&self) -> &Container {
        &self.services
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// Number of failure translations performed (0 or 1).
    pub fn translation_count(&self) -> usize {
        self.interceptor.translation_count()
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Handler;
    use crate::routing::{PatternMatcher, RouteCollection};
    use axum::http::{Method, StatusCode, Uri};

    fn options(routes: &RouteCollection) -> AppOptions {
        AppOptions::new(Arc::new(PatternMatcher::compile(routes).unwrap()))
    }

    fn get(path: &'static str) -> Request {
        Request::new(Method::GET, Uri::from_static(path))
    }

    #[test]
    fn test_construction_resolves_core_services() {
        let app = Application::new(options(&RouteCollection::new()), get("/")).unwrap();
        assert_eq!(app.request().path(), "/");
        assert!(!app.router().has_routed());
        assert!(app.services().has(services::SESSION));
        assert_eq!(app.debug_level(), DebugLevel::Prod);
    }

    #[test]
    fn test_core_services_are_singletons() {
        let app = Application::new(options(&RouteCollection::new()), get("/")).unwrap();
        let a = app.services().get_as::<Mutex<Request>>(services::REQUEST).unwrap();
        let b = app.services().get_as::<Mutex<Request>>(services::REQUEST).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &app.request));
    }

    #[test]
    fn test_debug_compare() {
        let app = Application::new(
            options(&RouteCollection::new()).with_debug_level(DebugLevel::Test),
            get("/"),
        )
        .unwrap();
        assert!(app.debug_compare(">", DebugLevel::Dev).unwrap());
        assert!(!app.debug_compare("==", DebugLevel::Prod).unwrap());
        assert!(matches!(
            app.debug_compare("<>", DebugLevel::Dev),
            Err(InvalidValueError::CompareOperator(op)) if op == "<>"
        ));
    }

    #[test]
    fn test_finish_without_route_is_no_route() {
        let mut app = Application::new(options(&RouteCollection::new()), get("/anything")).unwrap();
        app.dispatch().unwrap();
        let err = app.finish().unwrap_err();
        assert!(err.is_no_route());
        assert_eq!(
            err.to_string(),
            "No route exists for /anything using method GET and http"
        );
    }

    #[test]
    fn test_no_route_message_is_escaped() {
        let mut app =
            Application::new(options(&RouteCollection::new()), get("/search?a=1&b='x'")).unwrap();
        let err = app.finish().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("No route exists for /search?a=1&amp;b="));
        assert!(!message.contains('\''));
    }

    #[test]
    fn test_terminated_cycle_runs_no_more_code() {
        let mut routes = RouteCollection::new();
        routes.get("/", Handler::new("home", |_ctx| Err("boom".into())));
        let mut app = Application::new(options(&routes), get("/")).unwrap();
        app.run();
        assert!(app.is_terminated());
        assert!(matches!(app.dispatch(), Err(DispatchError::Terminated)));
        assert!(matches!(app.finish(), Err(DispatchError::Terminated)));
        assert_eq!(app.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_provider_panic_is_a_construction_error() {
        let opts = options(&RouteCollection::new()).with_services(|_| panic!("provider exploded"));
        let err = Application::new(opts, get("/")).err().unwrap();
        assert!(matches!(
            err,
            DispatchError::Container(ContainerError::FactoryFailed { ref key, ref reason })
                if key == "provider #0" && reason.starts_with("provider exploded")
        ));
        assert!(interception::take_pending().is_none());
    }

    #[test]
    fn test_provider_failure_aborts_construction() {
        let opts = options(&RouteCollection::new()).with_services(|c| {
            c.instance(services::ROUTE_MATCHER, 1u8)
        });
        let response = Application::handle(opts, get("/"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.is_sent());
    }
}
