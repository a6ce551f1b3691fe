//! Invoice generation.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Booking;
use parking_lot::RwLock;

use crate::error::SagaError;

#[async_trait]
pub trait DocumentsService: Send + Sync {
    /// Generates the booking's invoice and returns its number.
    async fn generate_invoice(&self, booking: &Booking) -> Result<String, SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryDocumentsState {
    invoices: Vec<(String, String)>,
    fail_on_invoice: bool,
}

/// In-memory documents service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentsService {
    state: Arc<RwLock<InMemoryDocumentsState>>,
}

impl InMemoryDocumentsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_invoice(&self, fail: bool) {
        self.state.write().fail_on_invoice = fail;
    }

    /// `(invoice number, reference code)` pairs in generation order.
    pub fn invoices(&self) -> Vec<(String, String)> {
        self.state.read().invoices.clone()
    }
}

#[async_trait]
impl DocumentsService for InMemoryDocumentsService {
    async fn generate_invoice(&self, booking: &Booking) -> Result<String, SagaError> {
        let mut state = self.state.write();
        if state.fail_on_invoice {
            return Err(SagaError::Notification(format!(
                "Could not generate an invoice for {}",
                booking.reference_code
            )));
        }

        let number = format!("INV-{:04}", state.invoices.len() + 1);
        state
            .invoices
            .push((number.clone(), booking.reference_code.clone()));
        Ok(number)
    }
}
