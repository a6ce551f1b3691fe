//! Booking mail delivery.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Booking;
use parking_lot::RwLock;

use crate::error::SagaError;

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_booking_notification(&self, booking: &Booking) -> Result<(), SagaError>;

    async fn send_invoice(&self, booking: &Booking, invoice_number: &str) -> Result<(), SagaError>;
}

/// A message accepted by [`InMemoryNotificationService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    Booking { reference_code: String },
    Invoice { reference_code: String, invoice_number: String },
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<SentNotification>,
    fail_on_send: bool,
}

/// In-memory mailer for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().fail_on_send = fail;
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.state.read().sent.clone()
    }

    fn deliver(&self, notification: SentNotification) -> Result<(), SagaError> {
        let mut state = self.state.write();
        if state.fail_on_send {
            return Err(SagaError::Notification("Mail delivery failed".to_string()));
        }
        state.sent.push(notification);
        Ok(())
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send_booking_notification(&self, booking: &Booking) -> Result<(), SagaError> {
        self.deliver(SentNotification::Booking {
            reference_code: booking.reference_code.clone(),
        })
    }

    async fn send_invoice(&self, booking: &Booking, invoice_number: &str) -> Result<(), SagaError> {
        self.deliver(SentNotification::Invoice {
            reference_code: booking.reference_code.clone(),
            invoice_number: invoice_number.to_string(),
        })
    }
}
