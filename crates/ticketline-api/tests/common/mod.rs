//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ticketline_api::routes;
use ticketline_api::state::{BookingState, CatalogState, PaymentState};
use ticketline_booking::client::CatalogClient;
use ticketline_booking::repository::InMemoryBookingRepository;
use ticketline_booking::service::BookingService;
use ticketline_catalog::service::CatalogService;
use ticketline_catalog::store::InMemoryEventStore;
use ticketline_core::clock::Clock;
use ticketline_core::retry::RetryPolicy;
use ticketline_payment::client::BookingClient;
use ticketline_payment::reconciliation::InMemoryReconciliationStore;
use ticketline_payment::repository::InMemoryPaymentRepository;
use ticketline_payment::service::PaymentService;
use ticketline_test_support::FixedClock;

/// Fixed timestamp used across all integration tests.
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::default())
}

/// Tight retry policy so outage tests finish quickly.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
    }
}

/// Builds the catalog server router over an in-memory store. Uses the same
/// route structure as the `catalog-api` binary.
pub fn catalog_app() -> Router {
    let service = Arc::new(CatalogService::new(
        Arc::new(InMemoryEventStore::new()),
        fixed_clock(),
    ));
    Router::new()
        .merge(routes::health::router())
        .nest("/api/events", routes::events::router())
        .with_state(CatalogState::new(service))
}

/// Builds the booking server router over an in-memory repository and the
/// given catalog client.
pub fn booking_app(catalog: Arc<dyn CatalogClient>) -> Router {
    let service = Arc::new(BookingService::new(
        Arc::new(InMemoryBookingRepository::new()),
        catalog,
        fixed_clock(),
        fast_retry(),
    ));
    Router::new()
        .merge(routes::health::router())
        .nest("/api/bookings", routes::bookings::router())
        .with_state(BookingState::new(service))
}

/// Builds the payment server router over in-memory stores and the given
/// booking client.
pub fn payment_app(bookings: Arc<dyn BookingClient>) -> Router {
    let service = Arc::new(PaymentService::new(
        Arc::new(InMemoryPaymentRepository::new()),
        bookings,
        Arc::new(InMemoryReconciliationStore::new()),
        fixed_clock(),
        fast_retry(),
    ));
    Router::new()
        .merge(routes::health::router())
        .nest("/api/payments", routes::payments::router())
        .with_state(PaymentState::new(service))
}

/// Send a request with a JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, body).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a DELETE request and return only the status; a 204 carries no body.
pub async fn delete(app: Router, uri: &str) -> StatusCode {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    app.oneshot(request).await.unwrap().status()
}
