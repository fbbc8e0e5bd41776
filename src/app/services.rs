//! Default service registrations.
//!
//! Every cycle gets a fresh container with these factories. Each one runs at
//! most once and resolves its dependencies by key.

use std::sync::{Arc, Mutex};

use crate::app::{lock, AppOptions};
use crate::container::{Container, ContainerError};
use crate::controller::{ErrorRenderer, ExceptionController};
use crate::http::{Request, Response, Session};
use crate::routing::{RouteMatcher, Router};

pub const REQUEST: &str = "request";
pub const RESPONSE: &str = "response";
pub const ROUTER: &str = "router";
pub const SESSION: &str = "session";
pub const EXCEPTION_CONTROLLER: &str = "exception.controller";
pub const ROUTE_MATCHER: &str = "route.matcher";

pub(crate) fn register_defaults(
    services: &Container,
    options: &AppOptions,
    request: Request,
) -> Result<(), ContainerError> {
    services.instance(ROUTE_MATCHER, options.matcher.clone())?;

    services.register(REQUEST, move |_| Ok(Mutex::new(request)))?;

    services.register(RESPONSE, |c| {
        let request = c.get_as::<Mutex<Request>>(REQUEST)?;
        let response = Response::for_request(&lock(&request));
        Ok(Mutex::new(response))
    })?;

    services.register(ROUTER, |c| {
        let matcher = c.get_as::<Arc<dyn RouteMatcher>>(ROUTE_MATCHER)?;
        Ok(Mutex::new(Router::new(matcher.as_ref().clone())))
    })?;

    services.register(SESSION, |_| Ok(Mutex::new(Session::new())))?;

    let show_detail = options.show_detail();
    services.register(EXCEPTION_CONTROLLER, move |_| {
        Ok(Arc::new(ExceptionController::new(show_detail)) as Arc<dyn ErrorRenderer>)
    })?;

    Ok(())
}
