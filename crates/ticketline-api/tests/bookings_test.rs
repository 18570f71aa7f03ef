//! Integration tests for the booking coordinator routes.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use ticketline_test_support::{StubCatalogClient, UnavailableCatalogClient};
use uuid::Uuid;

fn stub_catalog(seats: u32, price: i64) -> Arc<StubCatalogClient> {
    Arc::new(StubCatalogClient::with_event(seats, price, "PUBLISHED"))
}

async fn create_booking(
    app: &axum::Router,
    event_id: Uuid,
    user_id: Uuid,
    tickets: u32,
) -> (StatusCode, serde_json::Value) {
    common::post_json(
        app.clone(),
        "/api/bookings",
        &json!({ "userId": user_id, "eventId": event_id, "numberOfTickets": tickets }),
    )
    .await
}

#[tokio::test]
async fn test_create_booking_reserves_seats_and_is_pending() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog.clone());
    let user_id = Uuid::new_v4();

    let (status, json) = create_booking(&app, catalog.event_id(), user_id, 5).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["numberOfTickets"], 5);
    assert_eq!(json["totalAmount"], 22500);
    assert!(json["paymentId"].is_null());

    let reserves = catalog.reserved_calls();
    assert_eq!(reserves.len(), 1);
    assert_eq!(reserves[0].1, 5);
}

#[tokio::test]
async fn test_create_booking_with_zero_tickets_returns_400() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog.clone());

    let (status, json) = create_booking(&app, catalog.event_id(), Uuid::new_v4(), 0).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(catalog.reserved_calls().is_empty());
}

#[tokio::test]
async fn test_create_booking_when_catalog_down_returns_503() {
    let app = common::booking_app(Arc::new(UnavailableCatalogClient));

    let (status, json) = create_booking(&app, Uuid::new_v4(), Uuid::new_v4(), 2).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], 503);
}

#[tokio::test]
async fn test_create_booking_insufficient_seats_returns_400() {
    let catalog = stub_catalog(3, 4500);
    let app = common::booking_app(catalog.clone());

    let (status, _) = create_booking(&app, catalog.event_id(), Uuid::new_v4(), 10).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(catalog.reserved_calls().is_empty());
}

#[tokio::test]
async fn test_confirm_booking_attaches_payment_and_sets_confirmed() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog.clone());
    let (_, booking) = create_booking(&app, catalog.event_id(), Uuid::new_v4(), 2).await;
    let booking_id = booking["id"].as_str().unwrap();
    let payment_id = Uuid::new_v4();

    let (status, json) = common::post_json(
        app,
        &format!("/api/bookings/{booking_id}/confirm"),
        &json!({ "paymentId": payment_id }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "CONFIRMED");
    assert_eq!(json["paymentId"], payment_id.to_string());
}

#[tokio::test]
async fn test_second_confirm_returns_409() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog.clone());
    let (_, booking) = create_booking(&app, catalog.event_id(), Uuid::new_v4(), 2).await;
    let booking_id = booking["id"].as_str().unwrap();

    common::post_json(
        app.clone(),
        &format!("/api/bookings/{booking_id}/confirm"),
        &json!({ "paymentId": Uuid::new_v4() }),
    )
    .await;
    let (status, json) = common::post_json(
        app,
        &format!("/api/bookings/{booking_id}/confirm"),
        &json!({ "paymentId": Uuid::new_v4() }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
}

#[tokio::test]
async fn test_cancel_booking_releases_seats_and_returns_204() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog.clone());
    let (_, booking) = create_booking(&app, catalog.event_id(), Uuid::new_v4(), 5).await;
    let booking_id = booking["id"].as_str().unwrap();

    let status = common::delete(app.clone(), &format!("/api/bookings/{booking_id}")).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let releases = catalog.released_calls();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].1, 5);

    let (_, json) = common::get_json(app, &format!("/api/bookings/{booking_id}")).await;
    assert_eq!(json["status"], "CANCELLED");
}

#[tokio::test]
async fn test_cancel_twice_returns_409_without_second_release() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog.clone());
    let (_, booking) = create_booking(&app, catalog.event_id(), Uuid::new_v4(), 5).await;
    let booking_id = booking["id"].as_str().unwrap();

    common::delete(app.clone(), &format!("/api/bookings/{booking_id}")).await;
    let status = common::delete(app, &format!("/api/bookings/{booking_id}")).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(catalog.released_calls().len(), 1);
}

#[tokio::test]
async fn test_list_by_user_filters_other_users() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog.clone());
    let user_id = Uuid::new_v4();
    create_booking(&app, catalog.event_id(), user_id, 1).await;
    create_booking(&app, catalog.event_id(), Uuid::new_v4(), 1).await;

    let (status, json) = common::get_json(app, &format!("/api/bookings/user/{user_id}")).await;

    assert_eq!(status, StatusCode::OK);
    let bookings = json.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["userId"], user_id.to_string());
}

#[tokio::test]
async fn test_get_unknown_booking_returns_404() {
    let catalog = stub_catalog(100, 4500);
    let app = common::booking_app(catalog);

    let (status, json) =
        common::get_json(app, &format!("/api/bookings/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}
