//! Accommodation duplicate reports.
//!
//! Agents file reports; the review endpoints approve or disapprove them.
//! An approved report merges the listed accommodations in every agent's
//! search results.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use domain::{AccommodationDuplicateReport, SupplierAccommodationId};
use serde::Deserialize;

use crate::AppState;
use crate::agent::agent_from_headers;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct DuplicateReportRequest {
    pub accommodations: Vec<SupplierAccommodationId>,
}

/// POST /accommodations/duplicates
#[tracing::instrument(skip(state, headers, request))]
pub async fn report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<DuplicateReportRequest>,
) -> Result<(StatusCode, Json<AccommodationDuplicateReport>), ApiError> {
    let agent = agent_from_headers(&headers)?;
    let report = state.search.duplicates().report(&agent, request.accommodations)?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /accommodations/duplicates/:report_id: visible to the reporting
/// agency only.
#[tracing::instrument(skip(state, headers))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(report_id): Path<i64>,
) -> Result<Json<AccommodationDuplicateReport>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    state
        .search
        .duplicates()
        .get(report_id)
        .filter(|report| report.reporter_agency_id == agent.agency_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Duplicate report {report_id} not found")))
}

/// POST /admin/accommodations/duplicates/:report_id/approve
#[tracing::instrument(skip(state))]
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<i64>,
) -> Result<Json<AccommodationDuplicateReport>, ApiError> {
    Ok(Json(state.search.duplicates().approve(report_id)?))
}

/// POST /admin/accommodations/duplicates/:report_id/disapprove
#[tracing::instrument(skip(state))]
pub async fn disapprove(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<i64>,
) -> Result<Json<AccommodationDuplicateReport>, ApiError> {
    Ok(Json(state.search.duplicates().disapprove(report_id)?))
}
