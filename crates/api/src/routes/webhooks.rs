//! Supplier and payment provider webhooks.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::Supplier;
use domain::{Booking, Payment};
use saga::PaymentResponse;

use crate::AppState;
use crate::error::ApiError;

/// POST /webhooks/suppliers/:supplier: booking status pushed by an
/// asynchronous supplier. The body is parsed by that supplier's connector.
#[tracing::instrument(skip(state, payload))]
pub async fn supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<Booking>, ApiError> {
    let supplier: Supplier = supplier.parse().map_err(|e: common::ParseError| ApiError::NotFound(e.to_string()))?;
    metrics::counter!("webhooks_received_total", "source" => supplier.as_str()).increment(1);
    Ok(Json(state.saga.process_supplier_webhook(supplier, &payload).await?))
}

/// POST /webhooks/payments: payment status pushed by the gateway.
#[tracing::instrument(skip(state, response), fields(reference_code = %response.reference_code))]
pub async fn payment(
    State(state): State<Arc<AppState>>,
    Json(response): Json<PaymentResponse>,
) -> Result<Json<Payment>, ApiError> {
    metrics::counter!("webhooks_received_total", "source" => "payment").increment(1);
    Ok(Json(state.saga.payments().process_payment_response(response).await?))
}
