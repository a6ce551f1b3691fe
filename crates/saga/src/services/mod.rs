//! External service traits and in-memory implementations for saga steps.

pub mod account;
pub mod documents;
pub mod gateway;
pub mod notifications;

pub use account::{AccountPaymentService, InMemoryAccountPaymentService};
pub use documents::{DocumentsService, InMemoryDocumentsService};
pub use gateway::{InMemoryPaymentGateway, PaymentGateway};
pub use notifications::{InMemoryNotificationService, NotificationService, SentNotification};
