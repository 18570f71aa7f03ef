//! Routes for the booking coordinator service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use ticketline_booking::model::Booking;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::BookingState;

/// Body for POST /api/bookings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// The booking user.
    pub user_id: Uuid,
    /// The event to book seats on.
    pub event_id: Uuid,
    /// How many tickets.
    pub number_of_tickets: u32,
}

/// Body for POST /api/bookings/{id}/confirm.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBookingRequest {
    /// The payment that paid for the booking.
    pub payment_id: Uuid,
}

/// POST /api/bookings
async fn create_booking(
    State(state): State<BookingState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking = state
        .service
        .create_booking(request.user_id, request.event_id, request.number_of_tickets)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings
async fn list_bookings(State(state): State<BookingState>) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.service.list_bookings().await?))
}

/// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<BookingState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.service.get_booking(id).await?))
}

/// GET /api/bookings/user/{userId}
async fn list_by_user(
    State(state): State<BookingState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.service.list_by_user(user_id).await?))
}

/// POST /api/bookings/{id}/confirm
async fn confirm_booking(
    State(state): State<BookingState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConfirmBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(
        state.service.confirm_booking(id, request.payment_id).await?,
    ))
}

/// DELETE /api/bookings/{id}
async fn cancel_booking(
    State(state): State<BookingState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.cancel_booking(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the booking router, mounted under `/api/bookings`.
pub fn router() -> Router<BookingState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/{id}", get(get_booking).delete(cancel_booking))
        .route("/{id}/confirm", post(confirm_booking))
        .route("/user/{userId}", get(list_by_user))
}
