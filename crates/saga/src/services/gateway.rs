//! Card payment gateway trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::Money;
use parking_lot::RwLock;
use serde_json::{Value, json};

use crate::error::SagaError;

/// Card payment gateway. Every call returns the gateway's opaque payload,
/// which is stored with the payment row.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError>;

    async fn capture(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError>;

    async fn void(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError>;

    async fn refund(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    operations: Vec<(String, String)>,
    next_id: u32,
    fail_on_authorize: bool,
    fail_on_capture: bool,
    fail_on_void: bool,
    fail_on_refund: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_authorize(&self, fail: bool) {
        self.state.write().fail_on_authorize = fail;
    }

    pub fn set_fail_on_capture(&self, fail: bool) {
        self.state.write().fail_on_capture = fail;
    }

    pub fn set_fail_on_void(&self, fail: bool) {
        self.state.write().fail_on_void = fail;
    }

    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().fail_on_refund = fail;
    }

    /// `(operation, merchant reference)` pairs in call order, failed calls
    /// excluded.
    pub fn operations(&self) -> Vec<(String, String)> {
        self.state.read().operations.clone()
    }

    pub fn operation_count(&self, operation: &str) -> usize {
        self.state
            .read()
            .operations
            .iter()
            .filter(|(name, _)| name == operation)
            .count()
    }

    fn execute(&self, operation: &str, merchant_reference: &str, amount: Money) -> Result<Value, SagaError> {
        let mut state = self.state.write();
        let fail = match operation {
            "authorize" => state.fail_on_authorize,
            "capture" => state.fail_on_capture,
            "void" => state.fail_on_void,
            _ => state.fail_on_refund,
        };
        if fail {
            return Err(SagaError::PaymentGateway(format!(
                "{operation} declined for {merchant_reference}"
            )));
        }

        state.next_id += 1;
        let transaction_id = format!("TX-{:04}", state.next_id);
        state
            .operations
            .push((operation.to_string(), merchant_reference.to_string()));

        Ok(json!({
            "id": transaction_id,
            "operation": operation,
            "merchant_reference": merchant_reference,
            "amount": amount.amount.to_string(),
            "currency": amount.currency,
        }))
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn authorize(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError> {
        self.execute("authorize", merchant_reference, amount)
    }

    async fn capture(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError> {
        self.execute("capture", merchant_reference, amount)
    }

    async fn void(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError> {
        self.execute("void", merchant_reference, amount)
    }

    async fn refund(&self, merchant_reference: &str, amount: Money) -> Result<Value, SagaError> {
        self.execute("refund", merchant_reference, amount)
    }
}
