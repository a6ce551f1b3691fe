//! Booking saga constants and the registration gates.

use chrono::{DateTime, Days, Utc};
use common::PaymentMethod;
use domain::{AccommodationBookingSettings, effective_deadline};
use search::CachedOffer;

use crate::error::{Result, SagaError};

/// Saga type of the register, pay and book run.
pub const SAGA_TYPE_REGISTRATION: &str = "BookingRegistration";

/// Saga type of a run that books an already registered booking.
pub const SAGA_TYPE_FINALIZATION: &str = "BookingFinalization";

/// Saga type of a cancellation run.
pub const SAGA_TYPE_CANCELLATION: &str = "BookingCancellation";

/// Step name: Persist the booking row.
pub const STEP_REGISTER: &str = "register";

/// Step name: Charge the agency account when the deadline has passed.
pub const STEP_PAY_IF_DEADLINE_PASSED: &str = "pay_if_deadline_passed";

/// Step name: Send the booking to the supplier.
pub const STEP_BOOK_ON_SUPPLIER: &str = "book_on_supplier";

/// Step name: Invoice and notifications.
pub const STEP_POST_PROCESS: &str = "post_process";

/// Step name: Cancel the booking on the supplier.
pub const STEP_CANCEL_ON_SUPPLIER: &str = "cancel_on_supplier";

/// Step name: Void or refund the money.
pub const STEP_RETURN_MONEY: &str = "return_money";

/// Journal stream of a booking's saga runs.
pub fn stream_name(reference_code: &str) -> String {
    format!("booking-saga-{reference_code}")
}

/// Entity lock name for booking row mutation.
pub const BOOKING_LOCK_ENTITY: &str = "booking";

/// Entity lock name serializing saga runs on one booking.
pub const SAGA_LOCK_ENTITY: &str = "booking_saga";

/// Numerator sequence of booking ids.
pub const BOOKING_ID_SEQUENCE: &str = "booking_id";

pub const APR_REJECTION: &str =
    "You can't book the restricted contract without explicit approval from a Happytravel.com officer.";

pub const DEADLINE_REJECTION: &str =
    "You can't book the contract within deadline without explicit approval from a Happytravel.com officer.";

/// Advance-purchase-rate offers need the agent's APR mode to allow the
/// payment method.
pub fn check_apr(offer: &CachedOffer, settings: &AccommodationBookingSettings, method: PaymentMethod) -> Result<()> {
    if offer.room_contract_set.is_advance_purchase_rate && !settings.apr_mode.permits(method) {
        return Err(SagaError::Rejected(APR_REJECTION.to_string()));
    }
    Ok(())
}

/// Offers whose deadline falls on or before tomorrow (UTC) need the agent's
/// passed-deadline mode to allow the payment method.
pub fn check_deadline(
    offer: &CachedOffer,
    settings: &AccommodationBookingSettings,
    method: PaymentMethod,
    now: DateTime<Utc>,
) -> Result<()> {
    let deadline = effective_deadline(offer.room_contract_set.deadline.date, offer.check_in);
    let tomorrow = now.date_naive() + Days::new(1);
    if deadline.date_naive() > tomorrow || settings.passed_deadline_offers_mode.permits(method) {
        return Ok(());
    }
    Err(SagaError::Rejected(DEADLINE_REJECTION.to_string()))
}
