//! Search error types.

use domain::{DomainError, SupplierError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while searching or reading cached offers.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request was rejected before any supplier was contacted.
    #[error("{0}")]
    Validation(String),

    /// The search does not exist or belongs to another agent.
    #[error("Search not found: {0}")]
    NotFound(String),

    /// The offer is not in the evaluation cache, expired or its supplier
    /// is no longer enabled.
    #[error("Could not find the available room contract set")]
    OfferNotFound,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Supplier(#[from] SupplierError),
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
