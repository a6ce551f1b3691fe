//! Agency account balances charged for bookings paid from account.

use common::{AgencyId, Decimal, Money};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Prepaid balance of an agency plus the credit it may run into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyAccount {
    pub agency_id: AgencyId,
    pub balance: Money,
    pub credit_limit: Money,
}

impl AgencyAccount {
    pub fn new(agency_id: AgencyId, balance: Money, credit_limit: Money) -> Self {
        Self {
            agency_id,
            balance,
            credit_limit,
        }
    }

    /// Amount that can still be charged.
    pub fn available(&self) -> Decimal {
        self.balance.amount + self.credit_limit.amount
    }

    pub fn charge(&mut self, amount: Money) -> Result<(), DomainError> {
        self.check_amount(amount)?;
        if amount.amount > self.available() {
            return Err(DomainError::Validation(format!(
                "Insufficient funds on the account of agency {}: available {}, required {}",
                self.agency_id,
                Money::new(self.available(), self.balance.currency),
                amount
            )));
        }
        self.balance = self.balance.subtract(amount);
        Ok(())
    }

    pub fn refund(&mut self, amount: Money) -> Result<(), DomainError> {
        self.check_amount(amount)?;
        self.balance = self.balance.add(amount);
        Ok(())
    }

    fn check_amount(&self, amount: Money) -> Result<(), DomainError> {
        if amount.currency != self.balance.currency {
            return Err(DomainError::Validation(format!(
                "Account currency {} does not match payment currency {}",
                self.balance.currency, amount.currency
            )));
        }
        if !amount.is_positive() {
            return Err(DomainError::Validation("Payment amount must be positive".to_string()));
        }
        Ok(())
    }
}
