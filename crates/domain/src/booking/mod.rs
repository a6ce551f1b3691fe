//! Booking rows, status and reference codes.

mod model;
mod reference;
mod status;

pub use model::{
    AccommodationBookingRequest, Booking, StoredBookingDetails, StoredBookingRequest, SupplierResponseOutcome,
    effective_deadline,
};
pub use reference::{ACCOMMODATION_SERVICE_TYPE, ReferenceCodeGenerator, itn_from_reference_code};
pub use status::BookingStatus;
