//! Shared types for the accommodation booking core.
//!
//! Identifiers, money, suppliers and the explicit agent context used by the
//! search, pricing and booking crates.

pub mod agent;
pub mod money;
pub mod supplier;
pub mod types;

pub use agent::{AgentContext, PaymentMethod};
pub use money::{Currency, Money};
pub use supplier::Supplier;
pub use types::{AgencyId, AgentId, CounterpartyId, EndClientId, ResultId, RoomContractSetId, SearchId};

pub use rust_decimal::Decimal;

use thiserror::Error;

/// Errors raised when parsing shared enums from strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Unknown supplier: {0}")]
    UnknownSupplier(String),
}
