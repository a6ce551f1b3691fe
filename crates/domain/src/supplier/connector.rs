//! Supplier connector trait and per-supplier routing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Supplier;

use super::{
    AvailabilityRequest, AvailabilityResponse, SupplierBooking, SupplierBookingRequest, SupplierError,
    SupplierErrorCode,
};

/// One upstream supplier. Wire protocols live behind this trait.
#[async_trait]
pub trait SupplierConnector: Send + Sync {
    fn supplier(&self) -> Supplier;

    async fn get_availability(&self, request: &AvailabilityRequest) -> Result<AvailabilityResponse, SupplierError>;

    async fn book(&self, request: &SupplierBookingRequest) -> Result<SupplierBooking, SupplierError>;

    async fn cancel_booking(&self, reference_code: &str) -> Result<(), SupplierError>;

    /// Parses a pushed booking status update.
    fn parse_webhook(&self, payload: &serde_json::Value) -> Result<SupplierBooking, SupplierError> {
        serde_json::from_value(payload.clone()).map_err(|error| {
            SupplierError::new(
                SupplierErrorCode::BadRequest,
                format!("Invalid {} webhook payload: {error}", self.supplier()),
            )
        })
    }
}

/// Maps each supplier to its connector.
#[derive(Clone, Default)]
pub struct SupplierConnectorRouter {
    connectors: HashMap<Supplier, Arc<dyn SupplierConnector>>,
}

impl std::fmt::Debug for SupplierConnectorRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplierConnectorRouter")
            .field("suppliers", &self.suppliers())
            .finish()
    }
}

impl SupplierConnectorRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connector under the supplier it reports.
    pub fn register(&mut self, connector: Arc<dyn SupplierConnector>) -> &mut Self {
        self.connectors.insert(connector.supplier(), connector);
        self
    }

    pub fn with(mut self, connector: Arc<dyn SupplierConnector>) -> Self {
        self.register(connector);
        self
    }

    pub fn get(&self, supplier: Supplier) -> Result<Arc<dyn SupplierConnector>, SupplierError> {
        self.connectors
            .get(&supplier)
            .cloned()
            .ok_or_else(|| SupplierError::not_configured(supplier))
    }

    /// Registered suppliers in declaration order.
    pub fn suppliers(&self) -> Vec<Supplier> {
        let mut suppliers: Vec<_> = self.connectors.keys().copied().collect();
        suppliers.sort();
        suppliers
    }
}
