//! Booking rows and the supplier status transition shared by the
//! synchronous booking path and webhooks.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{
    AgencyId, AgentContext, AgentId, CounterpartyId, Money, PaymentMethod, ResultId, RoomContractSetId, SearchId,
    Supplier,
};
use serde::{Deserialize, Serialize};

use super::BookingStatus;
use crate::error::DomainError;
use crate::markup::AppliedMarkup;
use crate::payment::PaymentStatus;
use crate::supplier::{RoomPassengers, SupplierBooking, SupplierBookingStatus};

/// What an agent sends to book an evaluated offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccommodationBookingRequest {
    pub search_id: SearchId,
    pub result_id: ResultId,
    pub room_contract_set_id: RoomContractSetId,
    /// Existing itinerary number, or a reference code of a booking on it.
    #[serde(default)]
    pub itinerary_number: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub nationality: String,
    pub residency: String,
    pub rooms: Vec<RoomPassengers>,
    #[serde(default = "default_reject_if_unavailable")]
    pub reject_if_unavailable: bool,
}

fn default_reject_if_unavailable() -> bool {
    true
}

impl AccommodationBookingRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.rooms.is_empty() {
            return Err(DomainError::Validation("At least one room is required".to_string()));
        }
        if self.rooms.iter().any(|room| room.passengers.is_empty()) {
            return Err(DomainError::Validation("Every room needs at least one passenger".to_string()));
        }
        if self.main_passenger_name().is_none() {
            return Err(DomainError::Validation("A leading passenger is required".to_string()));
        }
        if self.nationality.is_empty() || self.residency.is_empty() {
            return Err(DomainError::Validation(
                "Nationality and residency are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn main_passenger_name(&self) -> Option<String> {
        self.rooms
            .iter()
            .flat_map(|room| room.passengers.iter())
            .find(|passenger| passenger.is_leader)
            .map(|passenger| format!("{} {}", passenger.first_name, passenger.last_name))
    }
}

/// Booking request as stored with the booking row.
///
/// New shapes get a new variant; old variants stay so stored rows keep
/// deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum StoredBookingRequest {
    V1(AccommodationBookingRequest),
}

impl StoredBookingRequest {
    pub fn request(&self) -> &AccommodationBookingRequest {
        match self {
            StoredBookingRequest::V1(request) => request,
        }
    }
}

/// Last supplier answer stored with the booking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum StoredBookingDetails {
    V1(SupplierBooking),
}

impl StoredBookingDetails {
    pub fn supplier_booking(&self) -> &SupplierBooking {
        match self {
            StoredBookingDetails::V1(booking) => booking,
        }
    }
}

/// `deadline`, or the start of the check-in day when the offer has none.
pub fn effective_deadline(deadline: Option<DateTime<Utc>>, check_in: NaiveDate) -> DateTime<Utc> {
    deadline.unwrap_or_else(|| check_in.and_time(NaiveTime::MIN).and_utc())
}

/// A registered accommodation booking. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub reference_code: String,
    pub itinerary_number: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub supplier: Supplier,
    pub agent_id: AgentId,
    pub agency_id: AgencyId,
    pub counterparty_id: CounterpartyId,
    pub accommodation_id: String,
    pub accommodation_name: String,
    pub country_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub deadline: Option<DateTime<Utc>>,
    pub is_advance_purchase_rate: bool,
    pub total_price: Money,
    #[serde(default)]
    pub applied_markups: Vec<AppliedMarkup>,
    pub request: StoredBookingRequest,
    #[serde(default)]
    pub details: Option<StoredBookingDetails>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub booking_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_date: Option<DateTime<Utc>>,
}

/// What applying a supplier answer did to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplierResponseOutcome {
    /// The booking was already terminal; nothing changed.
    Ignored,
    Applied {
        previous: BookingStatus,
        current: BookingStatus,
    },
}

impl Booking {
    /// `(deadline ?? check_in)` of the booked offer.
    pub fn effective_deadline(&self) -> DateTime<Utc> {
        effective_deadline(self.deadline, self.check_in)
    }

    pub fn belongs_to_agency(&self, agent: &AgentContext) -> bool {
        self.agency_id == agent.agency_id
    }

    pub fn supplier_reference(&self) -> Option<&str> {
        self.details
            .as_ref()
            .map(|details| details.supplier_booking().supplier_reference.as_str())
            .filter(|reference| !reference.is_empty())
    }

    /// Applies a supplier answer.
    ///
    /// Confirmation stamps the booking date; cancellation stamps the
    /// cancellation date and leaves payment handling to the caller. Answers
    /// for terminal bookings are ignored.
    pub fn apply_supplier_response(&mut self, response: &SupplierBooking, now: DateTime<Utc>) -> SupplierResponseOutcome {
        if !self.status.can_accept_supplier_response() {
            return SupplierResponseOutcome::Ignored;
        }

        let previous = self.status;
        let current = response.status.to_booking_status();
        match response.status {
            SupplierBookingStatus::Confirmed => self.booking_date = Some(now),
            SupplierBookingStatus::Cancelled => self.cancellation_date = Some(now),
            _ => {}
        }
        if response.deadline.is_some() {
            self.deadline = response.deadline;
        }
        self.status = current;
        self.details = Some(StoredBookingDetails::V1(response.clone()));

        SupplierResponseOutcome::Applied { previous, current }
    }

    /// Marks the booking cancelled after the supplier released it.
    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status == BookingStatus::Cancelled {
            return Err(DomainError::Validation("Booking was already cancelled".to_string()));
        }
        if !self.status.can_cancel() {
            return Err(DomainError::Validation(format!(
                "Booking in status {} cannot be cancelled",
                self.status
            )));
        }
        self.status = BookingStatus::Cancelled;
        self.cancellation_date = Some(now);
        Ok(())
    }
}
