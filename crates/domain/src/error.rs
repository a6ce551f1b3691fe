//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::markup::MarkupError;
use crate::supplier::SupplierError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the row store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A markup policy could not be stored or evaluated.
    #[error(transparent)]
    Markup(MarkupError),

    #[error("Currency conversion failed: {0}")]
    CurrencyConversion(String),

    /// Bad request shape, rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A supplier connector call failed.
    #[error(transparent)]
    Supplier(#[from] SupplierError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            key: key.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
