//! Saga error types.

use domain::{DomainError, SupplierError};
use search::SearchError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during booking and payment operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A business rule refused the booking. Nothing was written.
    #[error("{0}")]
    Rejected(String),

    /// Bad input or an operation not allowed in the current state.
    #[error("{0}")]
    Validation(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// The payment gateway refused or failed an operation.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// The agency account could not be charged or refunded.
    #[error("Account payment error: {0}")]
    AccountPayment(String),

    /// Invoice generation or mail delivery failed.
    #[error("Notification error: {0}")]
    Notification(String),

    #[error(transparent)]
    Supplier(#[from] SupplierError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
