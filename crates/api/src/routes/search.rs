//! Wide availability search endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::SearchId;
use domain::AvailabilityRequest;
use search::{SearchState, WideAvailabilityResult};
use serde::Serialize;

use crate::AppState;
use crate::agent::agent_from_headers;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct SearchStartedResponse {
    pub search_id: SearchId,
}

/// POST /search: dispatch the search to every enabled supplier. Returns
/// before any supplier answers.
#[tracing::instrument(skip(state, headers, request))]
pub async fn start(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AvailabilityRequest>,
) -> Result<(StatusCode, Json<SearchStartedResponse>), ApiError> {
    let agent = agent_from_headers(&headers)?;
    let search_id = state.search.start_search(request, &agent).await?;
    Ok((StatusCode::ACCEPTED, Json(SearchStartedResponse { search_id })))
}

/// GET /search/:search_id/state
#[tracing::instrument(skip(state, headers))]
pub async fn state(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(search_id): Path<String>,
) -> Result<Json<SearchState>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    let search_id = parse_search_id(&search_id)?;
    Ok(Json(state.search.get_state(search_id, &agent)?))
}

/// GET /search/:search_id/results: merged results of the suppliers that
/// answered so far.
#[tracing::instrument(skip(state, headers))]
pub async fn results(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(search_id): Path<String>,
) -> Result<Json<Vec<WideAvailabilityResult>>, ApiError> {
    let agent = agent_from_headers(&headers)?;
    let search_id = parse_search_id(&search_id)?;
    Ok(Json(state.search.get_result(search_id, &agent)?))
}

fn parse_search_id(id: &str) -> Result<SearchId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid search id: {e}")))?;
    Ok(SearchId::from_uuid(uuid))
}
