//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single dispatch fallback
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Bind server to listener with graceful shutdown
//! - Run one Application per request on a blocking worker
//! - Record request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::{AppOptions, Application};
use crate::config::AppConfig;
use crate::failure::FALLBACK_BODY;
use crate::http::request::{MakeRequestUuid, Request as AppRequest};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub options: AppOptions,
    pub config: Arc<AppConfig>,
}

/// HTTP front of the dispatch core.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, options: AppOptions) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            options,
            config: config.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The Axum router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            debug_level = %self.config.debug.level,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Buffer the request and hand it to a fresh Application.
async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.config.listener.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer request body");
            metrics::record_request(&method, 413, start_time);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let request = AppRequest::from_parts(parts, body);
    let options = state.options.clone();
    let response = match tokio::task::spawn_blocking(move || Application::handle(options, request)).await {
        Ok(response) => response.into_http(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch worker failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(FALLBACK_BODY)).into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
