//! Fan-out availability search across suppliers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{AgentContext, SearchId, Supplier};
use dashmap::DashMap;
use domain::{AvailabilityRequest, AvailabilityResult, BookingSettingsService, SupplierConnectorRouter, SupplierError};
use tokio::time::Instant;

use crate::duplicates::DuplicateRegistry;
use crate::error::{Result, SearchError};
use crate::evaluation::BookingEvaluationCache;
use crate::options::SearchOptions;
use crate::pricing::OfferPricer;
use crate::results::{WideAvailabilityResult, merge_results};
use crate::state::{SearchState, SupplierSearchState};

#[derive(Debug, Clone)]
struct SearchRecord {
    agent: AgentContext,
    suppliers: Vec<Supplier>,
    started: DateTime<Utc>,
}

/// Runs one task per supplier for every search and serves partial state
/// and merged results while they run.
///
/// Cloning is cheap; clones share every store.
#[derive(Clone)]
pub struct WideAvailabilitySearchOrchestrator {
    connectors: SupplierConnectorRouter,
    settings: BookingSettingsService,
    pricer: Arc<dyn OfferPricer>,
    duplicates: DuplicateRegistry,
    evaluation_cache: BookingEvaluationCache,
    searches: Arc<DashMap<SearchId, SearchRecord>>,
    states: Arc<DashMap<(SearchId, Supplier), SupplierSearchState>>,
    results: Arc<DashMap<(SearchId, Supplier), Vec<AvailabilityResult>>>,
    options: SearchOptions,
}

impl WideAvailabilitySearchOrchestrator {
    pub fn new(
        connectors: SupplierConnectorRouter,
        settings: BookingSettingsService,
        pricer: Arc<dyn OfferPricer>,
        duplicates: DuplicateRegistry,
        options: SearchOptions,
    ) -> Self {
        Self {
            connectors,
            settings,
            pricer,
            duplicates,
            evaluation_cache: BookingEvaluationCache::new(options.evaluation_ttl),
            searches: Arc::new(DashMap::new()),
            states: Arc::new(DashMap::new()),
            results: Arc::new(DashMap::new()),
            options,
        }
    }

    /// Cache of every offer this orchestrator priced. Shared with clones.
    pub fn evaluation_cache(&self) -> &BookingEvaluationCache {
        &self.evaluation_cache
    }

    pub fn duplicates(&self) -> &DuplicateRegistry {
        &self.duplicates
    }

    /// Dispatches the search to every supplier the agent may use and
    /// returns without waiting for any of them.
    #[tracing::instrument(skip(self, request), fields(agent_id = %agent.agent_id, country = %request.location.country_code))]
    pub async fn start_search(&self, request: AvailabilityRequest, agent: &AgentContext) -> Result<SearchId> {
        request.validate()?;

        let settings = self.settings.get(agent);
        let suppliers = resolve_suppliers(&settings.enabled_suppliers, &request.location.suppliers);
        if suppliers.is_empty() {
            return Err(SearchError::Validation(
                "No suppliers are available for the search".to_string(),
            ));
        }

        let search_id = SearchId::new();
        self.searches.insert(
            search_id,
            SearchRecord {
                agent: *agent,
                suppliers: suppliers.clone(),
                started: Utc::now(),
            },
        );
        for supplier in &suppliers {
            self.states
                .insert((search_id, *supplier), SupplierSearchState::pending(*supplier));
        }

        metrics::counter!("search_started_total").increment(1);
        tracing::info!(%search_id, suppliers = suppliers.len(), "search started");

        for supplier in suppliers {
            let orchestrator = self.clone();
            let request = request.clone();
            let agent = *agent;
            tokio::spawn(async move {
                orchestrator
                    .search_supplier(search_id, supplier, request, agent)
                    .await;
            });
        }

        Ok(search_id)
    }

    /// Current aggregate state of a search.
    pub fn get_state(&self, search_id: SearchId, agent: &AgentContext) -> Result<SearchState> {
        let record = self.record(search_id, agent)?;
        let states = record
            .suppliers
            .iter()
            .map(|supplier| {
                self.states
                    .get(&(search_id, *supplier))
                    .map(|state| state.clone())
                    .unwrap_or_else(|| SupplierSearchState::pending(*supplier))
            })
            .collect();
        Ok(SearchState::aggregate(search_id, states))
    }

    /// Merged results of every supplier that has answered so far.
    pub fn get_result(&self, search_id: SearchId, agent: &AgentContext) -> Result<Vec<WideAvailabilityResult>> {
        let record = self.record(search_id, agent)?;
        let settings = self.settings.get(agent);

        let pairs: Vec<(Supplier, AvailabilityResult)> = record
            .suppliers
            .iter()
            .flat_map(|supplier| {
                self.results
                    .get(&(search_id, *supplier))
                    .map(|results| results.iter().map(|result| (*supplier, result.clone())).collect())
                    .unwrap_or_else(Vec::new)
            })
            .collect();

        Ok(merge_results(
            pairs,
            &self.duplicates.index_for(agent),
            settings.is_supplier_visible,
        ))
    }

    /// Drops searches started before `cutoff` together with their state and
    /// results. Returns the number of searches removed.
    pub fn purge_started_before(&self, cutoff: DateTime<Utc>) -> usize {
        let expired: Vec<(SearchId, Vec<Supplier>)> = self
            .searches
            .iter()
            .filter(|record| record.started < cutoff)
            .map(|record| (*record.key(), record.suppliers.clone()))
            .collect();

        for (search_id, suppliers) in &expired {
            self.searches.remove(search_id);
            for supplier in suppliers {
                self.states.remove(&(*search_id, *supplier));
                self.results.remove(&(*search_id, *supplier));
            }
        }
        expired.len()
    }

    fn is_registered(&self, search_id: SearchId) -> bool {
        self.searches.contains_key(&search_id)
    }

    fn record(&self, search_id: SearchId, agent: &AgentContext) -> Result<SearchRecord> {
        self.searches
            .get(&search_id)
            .filter(|record| record.agent.agent_id == agent.agent_id)
            .map(|record| record.clone())
            .ok_or_else(|| SearchError::NotFound(search_id.to_string()))
    }

    async fn search_supplier(
        self,
        search_id: SearchId,
        supplier: Supplier,
        request: AvailabilityRequest,
        agent: AgentContext,
    ) {
        let started = Instant::now();
        let state = match self.fetch_and_price(search_id, supplier, &request, &agent).await {
            Ok(count) => {
                tracing::debug!(%search_id, %supplier, results = count, "supplier search completed");
                SupplierSearchState::completed(supplier, count)
            }
            Err(error) => {
                metrics::counter!("supplier_search_failed_total", "supplier" => supplier.as_str()).increment(1);
                tracing::warn!(%search_id, %supplier, %error, "supplier search failed");
                SupplierSearchState::failed(supplier, error.to_string())
            }
        };

        metrics::histogram!("supplier_search_duration_seconds", "supplier" => supplier.as_str())
            .record(started.elapsed().as_secs_f64());
        if self.is_registered(search_id) {
            self.states.insert((search_id, supplier), state);
        }
    }

    async fn fetch_and_price(
        &self,
        search_id: SearchId,
        supplier: Supplier,
        request: &AvailabilityRequest,
        agent: &AgentContext,
    ) -> Result<usize> {
        let connector = self.connectors.get(supplier)?;
        let timeout = self.options.supplier_timeout;
        let response = tokio::time::timeout(timeout, connector.get_availability(request))
            .await
            .map_err(|_| SupplierError::timeout(supplier, timeout.as_millis()))??;

        let priced = self.pricer.price(response.results, agent).await?;
        let count = priced.len();
        if !self.is_registered(search_id) {
            tracing::debug!(%search_id, %supplier, "search purged while in flight, results dropped");
            return Ok(count);
        }

        for result in &priced {
            self.evaluation_cache.set_result(search_id, supplier, agent.agent_id, result);
        }

        self.results.insert(
            (search_id, supplier),
            priced.into_iter().map(|priced| priced.result).collect(),
        );
        Ok(count)
    }
}

/// Enabled suppliers, narrowed to the location's suppliers when it names
/// any. Sorted in supplier order.
fn resolve_suppliers(enabled: &[Supplier], location: &[Supplier]) -> Vec<Supplier> {
    let mut suppliers: Vec<Supplier> = enabled
        .iter()
        .copied()
        .filter(|supplier| location.is_empty() || location.contains(supplier))
        .collect();
    suppliers.sort();
    suppliers.dedup();
    suppliers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_suppliers_narrow_enabled_ones() {
        let enabled = [Supplier::Rakuten, Supplier::Etg, Supplier::Illusions];
        assert_eq!(
            resolve_suppliers(&enabled, &[]),
            vec![Supplier::Illusions, Supplier::Etg, Supplier::Rakuten]
        );
        assert_eq!(
            resolve_suppliers(&enabled, &[Supplier::Etg, Supplier::Netstorming]),
            vec![Supplier::Etg]
        );
        assert!(resolve_suppliers(&enabled, &[Supplier::DirectContracts]).is_empty());
    }
}
