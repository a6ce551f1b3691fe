//! Booking saga for the accommodation booking core.
//!
//! This crate provides:
//! - [`BookingRegistrationSaga`]: register, pay, book on the supplier,
//!   cancel, with every run journaled per reference code
//! - [`PaymentAuthorizationController`]: card authorize, capture, void,
//!   refund and the payment webhook
//! - Supplier webhook reconciliation and capture scheduling
//! - External service traits with in-memory implementations

pub mod aggregate;
pub mod booking_registration;
pub mod bookings;
pub mod capture;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod options;
pub mod payments;
pub mod services;
pub mod state;
pub mod webhooks;

pub use aggregate::BookingSagaInstance;
pub use bookings::BookingRecords;
pub use capture::CaptureOutcome;
pub use coordinator::{BookingRegistrationSaga, BookingServices};
pub use error::{Result, SagaError};
pub use events::SagaEvent;
pub use options::SagaOptions;
pub use payments::{PaymentAuthorizationController, PaymentResponse};
pub use services::{
    AccountPaymentService, DocumentsService, InMemoryAccountPaymentService, InMemoryDocumentsService,
    InMemoryNotificationService, InMemoryPaymentGateway, NotificationService, PaymentGateway, SentNotification,
};
pub use state::SagaState;
