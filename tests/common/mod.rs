//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, Uri};
use maverick::app::DebugLevel;
use maverick::config::AppConfig;
use maverick::{AppOptions, HttpServer, PatternMatcher, Request, RouteCollection, Shutdown};

/// Options for a route table at the given debug level.
pub fn options(routes: &RouteCollection, level: DebugLevel) -> AppOptions {
    let matcher = PatternMatcher::compile(routes).expect("routes compile");
    AppOptions::new(Arc::new(matcher)).with_debug_level(level)
}

pub fn request(method: Method, uri: &str) -> Request {
    Request::new(method, uri.parse::<Uri>().expect("valid uri"))
}

pub fn get(uri: &str) -> Request {
    request(Method::GET, uri)
}

/// Start the HTTP server on `addr` and wait until it accepts connections.
pub async fn start_server(addr: SocketAddr, options: AppOptions) -> Shutdown {
    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, options);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Fresh public directory under the system temp dir.
pub fn temp_public_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("maverick-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
