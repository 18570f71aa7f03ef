//! Routes for the event catalog service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use ticketline_catalog::model::{Event, EventStatus};
use ticketline_catalog::service::{EventUpdate, NewEvent};
use ticketline_core::error::DomainError;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::CatalogState;

/// Body for POST /api/events and PUT /api/events/{id}.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    /// Display name.
    pub name: String,
    /// Total seating capacity.
    pub capacity: u32,
    /// Ticket price in minor currency units.
    pub price: i64,
    /// Lifecycle status; omitted means `PUBLISHED` on create and keep on
    /// update.
    pub status: Option<String>,
}

/// Body for PATCH /api/events/{id}/seats.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSeatsRequest {
    /// How many seats to reserve.
    pub seats_to_book: u32,
    /// Idempotency token; one is generated when omitted.
    pub reservation_ref: Option<Uuid>,
}

/// Body for POST /api/events/{id}/seats/release.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSeatsRequest {
    /// How many seats to hand back.
    pub seats_to_release: u32,
    /// Idempotency token; one is generated when omitted.
    pub reservation_ref: Option<Uuid>,
}

fn parse_status(status: Option<String>) -> Result<Option<EventStatus>, DomainError> {
    status
        .map(|value| EventStatus::parse(&value).map_err(DomainError::Validation))
        .transpose()
}

/// POST /api/events
async fn create_event(
    State(state): State<CatalogState>,
    Json(request): Json<EventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state
        .service
        .create_event(NewEvent {
            name: request.name,
            capacity: request.capacity,
            price: request.price,
            status: parse_status(request.status)?,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/events
async fn list_events(State(state): State<CatalogState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.service.list_events().await?))
}

/// GET /api/events/{id}
async fn get_event(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.service.get_event(id).await?))
}

/// PUT /api/events/{id}
async fn update_event(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .service
        .update_event(
            id,
            EventUpdate {
                name: request.name,
                capacity: request.capacity,
                price: request.price,
                status: parse_status(request.status)?,
            },
        )
        .await?;
    Ok(Json(event))
}

/// PATCH /api/events/{id}/seats
async fn reserve_seats(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSeatsRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .service
        .reserve_seats(id, request.seats_to_book, request.reservation_ref)
        .await?;
    Ok(Json(event))
}

/// POST /api/events/{id}/seats/release
async fn release_seats(
    State(state): State<CatalogState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReleaseSeatsRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .service
        .release_seats(id, request.seats_to_release, request.reservation_ref)
        .await?;
    Ok(Json(event))
}

/// Returns the catalog router, mounted under `/api/events`.
pub fn router() -> Router<CatalogState> {
    Router::new()
        .route("/", post(create_event).get(list_events))
        .route("/{id}", get(get_event).put(update_event))
        .route("/{id}/seats", patch(reserve_seats))
        .route("/{id}/seats/release", post(release_seats))
}
