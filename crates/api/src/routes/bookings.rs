//! Booking registration, finalization and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use domain::{AccommodationBookingRequest, Booking};
use saga::BookingSagaInstance;

use crate::AppState;
use crate::agent::agent_from_headers;
use crate::error::ApiError;

/// POST /bookings: register a booking for an evaluated offer without
/// contacting the supplier.
#[tracing::instrument(skip(state, headers, request))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AccommodationBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let agent = agent_from_headers(&headers)?;
    let booking = state.saga.register(request, &agent).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// POST /bookings/book: register and book on the supplier in one call.
/// Account payments only.
#[tracing::instrument(skip(state, headers, request))]
pub async fn register_and_book(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AccommodationBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let agent = agent_from_headers(&headers)?;
    let booking = state.saga.register_and_book(request, &agent).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings: bookings of the caller's agency, oldest first.
#[tracing::instrument(skip(state, headers))]
pub async fn list(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<Vec<Booking>>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    let mut bookings = state.saga.bookings().for_agency(agent.agency_id).await?;
    bookings.sort_by_key(|booking| booking.id);
    Ok(Json(bookings))
}

/// GET /bookings/:reference_code
#[tracing::instrument(skip(state, headers))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    Ok(Json(state.saga.get_booking(&reference_code, &agent).await?))
}

/// POST /bookings/:reference_code/finalize: book a paid booking on the
/// supplier.
#[tracing::instrument(skip(state, headers))]
pub async fn finalize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    Ok(Json(state.saga.finalize(&reference_code, &agent).await?))
}

/// POST /bookings/:reference_code/cancel
#[tracing::instrument(skip(state, headers))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    Ok(Json(state.saga.cancel(&reference_code, &agent).await?))
}

/// GET /bookings/:reference_code/saga: the latest saga run of the booking.
#[tracing::instrument(skip(state, headers))]
pub async fn saga_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<BookingSagaInstance>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    state.saga.get_booking(&reference_code, &agent).await?;
    Ok(Json(state.saga.saga_instance(&reference_code).await?))
}
