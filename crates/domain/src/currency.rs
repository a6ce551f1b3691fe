//! Currency conversion collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Currency, Decimal, Money};
use parking_lot::RwLock;

use crate::error::DomainError;

/// Currency conversion service.
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    /// Rate to multiply an amount in `from` by to express it in `to`.
    async fn rate(&self, from: Currency, to: Currency) -> Result<Decimal, DomainError>;

    /// Converts `amount` from `from` to `to`.
    async fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Result<Decimal, DomainError> {
        if from == to {
            return Ok(amount);
        }
        Ok(amount * self.rate(from, to).await?)
    }

    async fn convert_money(&self, money: Money, to: Currency) -> Result<Money, DomainError> {
        let amount = self.convert(money.amount, money.currency, to).await?;
        Ok(Money::new(amount, to))
    }
}

#[derive(Debug, Default)]
struct RateTable {
    rates: HashMap<(Currency, Currency), Decimal>,
    fail: bool,
    lookups: usize,
}

/// Rate-table converter for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCurrencyConverter {
    table: Arc<RwLock<RateTable>>,
}

impl InMemoryCurrencyConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rate and its inverse.
    pub fn set_rate(&self, from: Currency, to: Currency, rate: Decimal) {
        let mut table = self.table.write();
        table.rates.insert((from, to), rate);
        if !rate.is_zero() {
            table.rates.insert((to, from), Decimal::ONE / rate);
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.table.write().fail = fail;
    }

    /// Number of rate lookups served, identity lookups excluded.
    pub fn lookup_count(&self) -> usize {
        self.table.read().lookups
    }
}

#[async_trait]
impl CurrencyConverter for InMemoryCurrencyConverter {
    async fn rate(&self, from: Currency, to: Currency) -> Result<Decimal, DomainError> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let mut table = self.table.write();
        if table.fail {
            return Err(DomainError::CurrencyConversion(format!(
                "Rate service unavailable for {from} to {to}"
            )));
        }
        table.lookups += 1;
        table
            .rates
            .get(&(from, to))
            .copied()
            .ok_or_else(|| DomainError::CurrencyConversion(format!("No rate from {from} to {to}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn converts_with_registered_rate_and_inverse() {
        let converter = InMemoryCurrencyConverter::new();
        converter.set_rate(Currency::Usd, Currency::Aed, Decimal::new(3_6725, 4));

        let aed = converter
            .convert(Decimal::new(100, 0), Currency::Usd, Currency::Aed)
            .await
            .unwrap();
        assert_eq!(aed, Decimal::new(367_2500, 4));

        let rate = converter.rate(Currency::Aed, Currency::Usd).await.unwrap();
        assert_eq!(rate, Decimal::ONE / Decimal::new(3_6725, 4));
    }

    #[tokio::test]
    async fn same_currency_needs_no_rate() {
        let converter = InMemoryCurrencyConverter::new();
        let money = Money::from_minor(1000, Currency::Eur);
        assert_eq!(converter.convert_money(money, Currency::Eur).await.unwrap(), money);
        assert_eq!(converter.lookup_count(), 0);
    }

    #[tokio::test]
    async fn missing_rate_is_an_error() {
        let converter = InMemoryCurrencyConverter::new();
        let result = converter.rate(Currency::Usd, Currency::Jpy).await;
        assert!(matches!(result, Err(DomainError::CurrencyConversion(_))));
    }
}
