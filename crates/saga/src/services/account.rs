//! Agency account payments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AgencyId, Money};
use domain::AgencyAccount;
use parking_lot::RwLock;

use crate::error::SagaError;

/// Charges and refunds agency balances for non-card bookings.
#[async_trait]
pub trait AccountPaymentService: Send + Sync {
    async fn charge(&self, agency_id: AgencyId, amount: Money, reference_code: &str) -> Result<(), SagaError>;

    async fn refund(&self, agency_id: AgencyId, amount: Money, reference_code: &str) -> Result<(), SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryAccountState {
    accounts: HashMap<AgencyId, AgencyAccount>,
    charges: Vec<(String, Money)>,
    refunds: Vec<(String, Money)>,
    fail_on_charge: bool,
    fail_on_refund: bool,
}

/// In-memory agency accounts for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountPaymentService {
    state: Arc<RwLock<InMemoryAccountState>>,
}

impl InMemoryAccountPaymentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_account(&self, account: AgencyAccount) {
        self.state.write().accounts.insert(account.agency_id, account);
    }

    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().fail_on_charge = fail;
    }

    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().fail_on_refund = fail;
    }

    pub fn balance(&self, agency_id: AgencyId) -> Option<Money> {
        self.state.read().accounts.get(&agency_id).map(|account| account.balance)
    }

    /// Reference codes charged so far.
    pub fn charged(&self) -> Vec<String> {
        self.state.read().charges.iter().map(|(code, _)| code.clone()).collect()
    }

    /// Reference codes refunded so far.
    pub fn refunded(&self) -> Vec<String> {
        self.state.read().refunds.iter().map(|(code, _)| code.clone()).collect()
    }
}

#[async_trait]
impl AccountPaymentService for InMemoryAccountPaymentService {
    async fn charge(&self, agency_id: AgencyId, amount: Money, reference_code: &str) -> Result<(), SagaError> {
        let mut state = self.state.write();
        if state.fail_on_charge {
            return Err(SagaError::AccountPayment(format!(
                "Account charge for {reference_code} failed"
            )));
        }

        let account = state
            .accounts
            .get_mut(&agency_id)
            .ok_or_else(|| SagaError::AccountPayment(format!("Agency {agency_id} has no account")))?;
        account
            .charge(amount)
            .map_err(|error| SagaError::AccountPayment(error.to_string()))?;
        state.charges.push((reference_code.to_string(), amount));
        Ok(())
    }

    async fn refund(&self, agency_id: AgencyId, amount: Money, reference_code: &str) -> Result<(), SagaError> {
        let mut state = self.state.write();
        if state.fail_on_refund {
            return Err(SagaError::AccountPayment(format!(
                "Account refund for {reference_code} failed"
            )));
        }

        let account = state
            .accounts
            .get_mut(&agency_id)
            .ok_or_else(|| SagaError::AccountPayment(format!("Agency {agency_id} has no account")))?;
        account
            .refund(amount)
            .map_err(|error| SagaError::AccountPayment(error.to_string()))?;
        state.refunds.push((reference_code.to_string(), amount));
        Ok(())
    }
}
