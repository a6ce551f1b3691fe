//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use saga::SagaError;
use search::SearchError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    Search(SearchError),
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Search(err) => (search_status(&err), err.to_string()),
            ApiError::Saga(err) => (saga_status(&err), err.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn search_status(err: &SearchError) -> StatusCode {
    match err {
        SearchError::Validation(_) => StatusCode::BAD_REQUEST,
        SearchError::NotFound(_) | SearchError::OfferNotFound => StatusCode::NOT_FOUND,
        SearchError::Domain(err) => domain_status(err),
        SearchError::Store(err) => store_status(err),
        SearchError::Supplier(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn saga_status(err: &SagaError) -> StatusCode {
    match err {
        SagaError::Validation(_) => StatusCode::BAD_REQUEST,
        SagaError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SagaError::BookingNotFound(_) => StatusCode::NOT_FOUND,
        SagaError::Search(err) => search_status(err),
        SagaError::Domain(err) => domain_status(err),
        SagaError::Store(err) => store_status(err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Store(err) => store_status(err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::ConcurrencyConflict { .. } | StoreError::AlreadyExists(_) | StoreError::LockTimeout { .. } => {
            StatusCode::CONFLICT
        }
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::Search(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}
