//! HTTP server tests over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;

use maverick::app::DebugLevel;
use maverick::resolver::Controller;
use maverick::view::exception::GENERIC_NOT_FOUND_MESSAGE;
use maverick::{ActionTable, Handler, RouteCollection};

mod common;

fn routes() -> RouteCollection {
    let mut routes = RouteCollection::new();
    routes
        .get(
            "/",
            Handler::new("home", |ctx| {
                ctx.response.set_body("home");
                Ok(())
            }),
        )
        .post(
            "/echo",
            Handler::new("echo", |ctx| {
                let body = String::from_utf8_lossy(ctx.request.body()).into_owned();
                ctx.response.set_body(body);
                Ok(())
            }),
        )
        .get("/items/{id:[0-9]+}", "items->show")
        .get(
            "/boom",
            Handler::new("boom", |_ctx| panic!("exploded")),
        );
    routes
}

fn options(level: DebugLevel) -> maverick::AppOptions {
    common::options(&routes(), level).with_services(|services| {
        let items = ActionTable::new().action("items", "show", |ctx| {
            let id = ctx.require_param("id")?.to_string();
            ctx.response.set_body(format!("item {}", id));
            Ok(())
        });
        services.instance("items", Arc::new(items) as Arc<dyn Controller>)
    })
}

#[tokio::test]
async fn test_routes_over_http() {
    let addr: SocketAddr = "127.0.0.1:28481".parse().unwrap();
    let shutdown = common::start_server(addr, options(DebugLevel::Prod)).await;
    let client = common::client();

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "home");

    let res = client.get(format!("http://{}/items/9", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "item 9");

    let res = client
        .post(format!("http://{}/echo", addr))
        .body("ping")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ping");

    shutdown.trigger();
}

#[tokio::test]
async fn test_not_found_over_http() {
    let addr: SocketAddr = "127.0.0.1:28482".parse().unwrap();
    let shutdown = common::start_server(addr, options(DebugLevel::Prod)).await;
    let client = common::client();

    let res = client.get(format!("http://{}/items/abc", addr)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert!(res.text().await.unwrap().contains(GENERIC_NOT_FOUND_MESSAGE));

    let res = client.delete(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn test_panic_becomes_server_error() {
    let addr: SocketAddr = "127.0.0.1:28483".parse().unwrap();
    let shutdown = common::start_server(addr, options(DebugLevel::Dev)).await;
    let client = common::client();

    let res = client.get(format!("http://{}/boom", addr)).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert!(body.contains("exploded"));

    // The server keeps serving after a failed cycle.
    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let addr: SocketAddr = "127.0.0.1:28484".parse().unwrap();
    let shutdown = common::start_server(addr, options(DebugLevel::Prod)).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/nowhere", addr))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    shutdown.trigger();
}
