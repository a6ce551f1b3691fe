//! Card payment and capture endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use domain::Payment;
use saga::CaptureOutcome;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::agent::agent_from_headers;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CaptureQuery {
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct CaptureCandidatesResponse {
    pub date: DateTime<Utc>,
    pub booking_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct CaptureRequest {
    pub booking_ids: Vec<i64>,
}

/// GET /bookings/:reference_code/payments: payments of the booking, oldest
/// first.
#[tracing::instrument(skip(state, headers))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    state.saga.get_booking(&reference_code, &agent).await?;
    Ok(Json(state.saga.payments().payments_for(&reference_code).await?))
}

/// POST /bookings/:reference_code/payments/authorize
#[tracing::instrument(skip(state, headers))]
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    state.saga.get_booking(&reference_code, &agent).await?;
    Ok(Json(state.saga.payments().authorize(&reference_code).await?))
}

/// POST /bookings/:reference_code/payments/capture
#[tracing::instrument(skip(state, headers))]
pub async fn capture(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    state.saga.get_booking(&reference_code, &agent).await?;
    Ok(Json(state.saga.payments().capture(&reference_code).await?))
}

/// POST /bookings/:reference_code/payments/void
#[tracing::instrument(skip(state, headers))]
pub async fn void(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    state.saga.get_booking(&reference_code, &agent).await?;
    Ok(Json(state.saga.payments().void(&reference_code).await?))
}

/// POST /bookings/:reference_code/payments/refund
#[tracing::instrument(skip(state, headers))]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference_code): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    state.saga.get_booking(&reference_code, &agent).await?;
    Ok(Json(state.saga.payments().refund(&reference_code).await?))
}

/// GET /capture?date=: ids of bookings whose authorized payment is due for
/// capture.
#[tracing::instrument(skip(state, query))]
pub async fn capture_candidates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CaptureQuery>,
) -> Result<Json<CaptureCandidatesResponse>, ApiError> {
    let date = query.date.unwrap_or_else(Utc::now);
    let booking_ids = state.saga.get_for_capture(date).await?;
    Ok(Json(CaptureCandidatesResponse { date, booking_ids }))
}

/// POST /capture: capture each listed booking's payment and report every
/// outcome.
#[tracing::instrument(skip(state, request), fields(count = request.booking_ids.len()))]
pub async fn capture_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CaptureRequest>,
) -> Json<Vec<CaptureOutcome>> {
    Json(state.saga.capture(&request.booking_ids).await)
}
