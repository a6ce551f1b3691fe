//! Supplier connector contract and the request/response shapes crossing it.

mod connector;
mod fake;

pub use connector::{SupplierConnector, SupplierConnectorRouter};
pub use fake::InMemorySupplierConnector;

use chrono::{DateTime, NaiveDate, Utc};
use common::{ResultId, RoomContractSetId, SearchId, Supplier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::BookingStatus;
use crate::error::DomainError;
use crate::offer::{AvailabilityResult, Occupancy};

/// Machine-readable class of a supplier failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplierErrorCode {
    /// The supplier could not be reached or answered with a server error.
    Unavailable,
    Timeout,
    /// The supplier refused the request shape.
    BadRequest,
    NotFound,
    /// No connector is registered for the supplier.
    NotConfigured,
}

/// Structured failure returned by a supplier connector.
///
/// The message is human readable and is what ends up in search state and
/// booking logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct SupplierError {
    pub code: SupplierErrorCode,
    pub message: String,
}

impl SupplierError {
    pub fn new(code: SupplierErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SupplierErrorCode::Unavailable, message)
    }

    pub fn timeout(supplier: Supplier, elapsed_ms: u128) -> Self {
        Self::new(
            SupplierErrorCode::Timeout,
            format!("Supplier {supplier} timed out after {elapsed_ms} ms"),
        )
    }

    pub fn not_configured(supplier: Supplier) -> Self {
        Self::new(
            SupplierErrorCode::NotConfigured,
            format!("No connector is registered for supplier {supplier}"),
        )
    }
}

/// Where to search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// ISO 3166 alpha-2 country code.
    pub country_code: String,
    /// Suppliers that cover the location. Empty means no restriction.
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
}

/// Generic availability request, converted per supplier by its connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub location: Location,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: Vec<Occupancy>,
    pub nationality: String,
    pub residency: String,
}

impl AvailabilityRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.check_out <= self.check_in {
            return Err(DomainError::Validation(
                "Check out date must be after check in date".to_string(),
            ));
        }
        if self.rooms.is_empty() {
            return Err(DomainError::Validation("At least one room is required".to_string()));
        }
        if self.rooms.iter().any(|room| room.adults == 0) {
            return Err(DomainError::Validation("Every room needs at least one adult".to_string()));
        }
        Ok(())
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Availability returned by one supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub supplier: Supplier,
    pub results: Vec<AvailabilityResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub is_leader: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPassengers {
    pub room_type: String,
    pub passengers: Vec<Passenger>,
}

/// What a connector needs to book a room-contract-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierBookingRequest {
    pub reference_code: String,
    pub search_id: SearchId,
    pub result_id: ResultId,
    pub room_contract_set_id: RoomContractSetId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: Vec<RoomPassengers>,
    pub nationality: String,
    pub residency: String,
    /// Fail instead of booking a different price when the offer changed.
    #[serde(default = "default_reject_if_unavailable")]
    pub reject_if_unavailable: bool,
}

fn default_reject_if_unavailable() -> bool {
    true
}

/// Booking status as reported by a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplierBookingStatus {
    /// The supplier accepted the request but has no answer yet.
    Processing,
    WaitingForResponse,
    Pending,
    Confirmed,
    Cancelled,
    Rejected,
    Invalid,
}

impl SupplierBookingStatus {
    /// Booking status the supplier status maps onto.
    pub fn to_booking_status(self) -> BookingStatus {
        match self {
            SupplierBookingStatus::Processing | SupplierBookingStatus::WaitingForResponse => {
                BookingStatus::WaitingForResponse
            }
            SupplierBookingStatus::Pending => BookingStatus::Pending,
            SupplierBookingStatus::Confirmed => BookingStatus::Confirmed,
            SupplierBookingStatus::Cancelled => BookingStatus::Cancelled,
            SupplierBookingStatus::Rejected => BookingStatus::Rejected,
            SupplierBookingStatus::Invalid => BookingStatus::Invalid,
        }
    }
}

/// Booking details returned by a supplier, synchronously or by webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierBooking {
    pub reference_code: String,
    #[serde(default)]
    pub supplier_reference: String,
    pub status: SupplierBookingStatus,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}
