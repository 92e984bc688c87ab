#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use storefront_api::{
    discovery::ServiceDiscovery,
    events::EventSender,
    handlers,
    services::{CartService, CheckoutService},
    store::{CartStore, CheckoutLedger},
};

/// Event sender whose receiver side is drained by a background task, so
/// services under test never block on event delivery.
pub fn event_sender() -> Arc<EventSender> {
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    Arc::new(EventSender::new(tx))
}

/// Checkout service wired for tests; exposes the ledger for assertions.
pub fn checkout_app() -> (Router, Arc<CheckoutLedger>) {
    let ledger = Arc::new(CheckoutLedger::new());
    let service = Arc::new(CheckoutService::new(ledger.clone(), event_sender()));
    let router = handlers::checkout::checkout_routes()
        .merge(handlers::health::health_routes())
        .with_state(service);
    (router, ledger)
}

/// Cart service wired for tests against the given discovery backend.
pub fn cart_app(
    discovery: Arc<dyn ServiceDiscovery>,
    expose_entry_removal: bool,
) -> (Router, Arc<CartStore>) {
    let store = Arc::new(CartStore::new());
    let service = Arc::new(CartService::new(
        store.clone(),
        discovery,
        reqwest::Client::new(),
        event_sender(),
        "checkout".to_string(),
    ));
    let router = handlers::carts::carts_routes(expose_entry_removal)
        .merge(handlers::health::health_routes())
        .with_state(service);
    (router, store)
}

/// Drives one request through the router and returns status plus parsed body.
pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("failed to build request"),
        None => builder.body(Body::empty()).expect("failed to build request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request did not complete");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body was not JSON")
    };

    (status, value)
}
