//! Domain layer of the accommodation booking core.
//!
//! This crate provides:
//! - The offer tree and leaf-level price processing
//! - Markup templates, policies and their resolution per agent
//! - Booking settings merged across agent, agency and counterparty scopes
//! - Booking and payment records, statuses and reference codes
//! - The supplier connector contract and router
//! - The currency conversion contract

pub mod account;
pub mod booking;
pub mod currency;
pub mod duplicates;
pub mod error;
pub mod markup;
pub mod offer;
pub mod payment;
pub mod settings;
pub mod supplier;

pub use account::AgencyAccount;
pub use booking::{
    AccommodationBookingRequest, Booking, BookingStatus, ReferenceCodeGenerator, StoredBookingDetails,
    StoredBookingRequest, SupplierResponseOutcome, effective_deadline, itn_from_reference_code,
};
pub use currency::{CurrencyConverter, InMemoryCurrencyConverter};
pub use duplicates::{AccommodationDuplicateReport, DuplicateReportState, SupplierAccommodationId};
pub use error::{DomainError, Result};
pub use markup::{
    AppliedMarkup, Markup, MarkupError, MarkupPolicy, MarkupPolicyData, MarkupPolicyManager, MarkupPolicyScope,
    MarkupPolicyTarget, MarkupResolutionEngine, MarkupScopeType, MarkupTemplate, PriceFunction, TemplateSettings,
};
pub use offer::{
    Accommodation, AvailabilityResult, BoardBasis, CancellationPolicy, DailyRate, Deadline, Occupancy, Price,
    PriceTree, RoomContract, RoomContractSet, process_prices,
};
pub use payment::{Payment, PaymentStatus, merchant_reference};
pub use settings::{
    AccommodationBookingSettings, AprMode, BookingSettingsService, PassedDeadlineOffersMode, ScopeBookingSettings,
    merge_settings,
};
pub use supplier::{
    AvailabilityRequest, AvailabilityResponse, InMemorySupplierConnector, Location, Passenger, RoomPassengers,
    SupplierBooking, SupplierBookingRequest, SupplierBookingStatus, SupplierConnector, SupplierConnectorRouter,
    SupplierError, SupplierErrorCode,
};
