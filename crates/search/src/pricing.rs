//! Supplier result pricing: conversion, markup, then the currency ceiling.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AgentContext, Currency, Decimal, Money};
use domain::{
    AppliedMarkup, AvailabilityResult, CurrencyConverter, MarkupPolicy, MarkupPolicyManager, MarkupPolicyTarget,
    MarkupResolutionEngine, process_prices,
};
use futures_util::future::try_join_all;
use store::{KeyedStore, Numerator};

use crate::error::Result;

/// A supplier result priced for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedResult {
    pub result: AvailabilityResult,
    pub applied_markups: Vec<AppliedMarkup>,
}

/// Prices raw supplier results for an agent.
#[async_trait]
pub trait OfferPricer: Send + Sync {
    async fn price(&self, results: Vec<AvailabilityResult>, agent: &AgentContext) -> Result<Vec<PricedResult>>;
}

/// Converts, marks up and rounds every leaf price of supplier results.
pub struct PriceProcessor<S, N, C>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
    C: CurrencyConverter,
{
    markups: MarkupResolutionEngine<S, N, C>,
    converter: C,
}

impl<S, N, C> PriceProcessor<S, N, C>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
    C: CurrencyConverter + Clone,
{
    pub fn new(
        policies: Arc<MarkupPolicyManager<S, N>>,
        settings: domain::BookingSettingsService,
        converter: C,
    ) -> Self {
        Self {
            markups: MarkupResolutionEngine::new(policies, settings, converter.clone()),
            converter,
        }
    }
}

impl<S, N, C> PriceProcessor<S, N, C>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
    C: CurrencyConverter,
{
    /// Looks up one rate per distinct source currency, failing on the first
    /// missing rate.
    async fn rates(&self, results: &[AvailabilityResult], target: Currency) -> Result<HashMap<Currency, Decimal>> {
        let mut currencies: Vec<Currency> = results.iter().flat_map(AvailabilityResult::currencies).collect();
        currencies.sort();
        currencies.dedup();

        let lookups = currencies.into_iter().map(|currency| async move {
            let rate = if currency == target {
                Decimal::ONE
            } else {
                self.converter.rate(currency, target).await?
            };
            Ok::<_, domain::DomainError>((currency, rate))
        });
        Ok(try_join_all(lookups).await?.into_iter().collect())
    }
}

#[async_trait]
impl<S, N, C> OfferPricer for PriceProcessor<S, N, C>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
    C: CurrencyConverter,
{
    #[tracing::instrument(skip(self, results), fields(results = results.len(), agent_id = %agent.agent_id))]
    async fn price(&self, results: Vec<AvailabilityResult>, agent: &AgentContext) -> Result<Vec<PricedResult>> {
        let target = agent.currency;
        let rates = self.rates(&results, target).await?;
        let markup = self
            .markups
            .get(agent, MarkupPolicyTarget::AccommodationAvailability)
            .await?;

        let converted = process_prices(results, |price: Money| match rates.get(&price.currency) {
            Some(rate) => Money::new(price.amount * *rate, target),
            None => price,
        });
        let marked_up = process_prices(converted, |price| markup.apply(price));
        let rounded = process_prices(marked_up, |price: Money| price.ceil());

        Ok(rounded
            .into_iter()
            .map(|result| PricedResult {
                result,
                applied_markups: markup.applied_policies().to_vec(),
            })
            .collect())
    }
}
