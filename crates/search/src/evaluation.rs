//! Priced offers remembered between search and booking.

use std::time::Duration;

use chrono::NaiveDate;
use common::{AgentId, ResultId, RoomContractSetId, SearchId, Supplier};
use domain::{Accommodation, AppliedMarkup, RoomContractSet};
use serde::{Deserialize, Serialize};
use store::TtlCache;

use crate::error::{Result, SearchError};
use crate::pricing::PricedResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationKey {
    pub search_id: SearchId,
    pub result_id: ResultId,
    pub room_contract_set_id: RoomContractSetId,
}

impl EvaluationKey {
    pub fn new(search_id: SearchId, result_id: ResultId, room_contract_set_id: RoomContractSetId) -> Self {
        Self {
            search_id,
            result_id,
            room_contract_set_id,
        }
    }
}

/// One room-contract-set exactly as it was priced and shown to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedOffer {
    /// The agent the offer was returned to.
    pub agent_id: AgentId,
    pub supplier: Supplier,
    pub accommodation: Accommodation,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_contract_set: RoomContractSet,
    pub applied_markups: Vec<AppliedMarkup>,
}

/// Cache of priced offers keyed by `(search, result, room contract set)`.
///
/// Reading an entry does not consume it: registering twice against the same
/// key within the TTL yields two bookings.
#[derive(Debug, Clone)]
pub struct BookingEvaluationCache {
    offers: TtlCache<EvaluationKey, CachedOffer>,
}

impl BookingEvaluationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            offers: TtlCache::new(ttl),
        }
    }

    pub fn set(&self, key: EvaluationKey, offer: CachedOffer) {
        self.offers.set(key, offer);
    }

    /// Caches every room-contract-set of a priced result.
    pub fn set_result(&self, search_id: SearchId, supplier: Supplier, agent_id: AgentId, priced: &PricedResult) {
        let result = &priced.result;
        for set in &result.room_contract_sets {
            self.set(
                EvaluationKey::new(search_id, result.id, set.id),
                CachedOffer {
                    agent_id,
                    supplier,
                    accommodation: result.accommodation.clone(),
                    check_in: result.check_in,
                    check_out: result.check_out,
                    room_contract_set: set.clone(),
                    applied_markups: priced.applied_markups.clone(),
                },
            );
        }
    }

    /// Returns the cached offer unless it expired, was returned to another
    /// agent, or its supplier is not in `enabled_suppliers`.
    pub fn get(&self, key: &EvaluationKey, agent_id: AgentId, enabled_suppliers: &[Supplier]) -> Result<CachedOffer> {
        self.offers
            .get(key)
            .filter(|offer| offer.agent_id == agent_id)
            .filter(|offer| enabled_suppliers.contains(&offer.supplier))
            .ok_or(SearchError::OfferNotFound)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{Currency, Money};
    use domain::{AvailabilityResult, BoardBasis, DailyRate, Deadline, Occupancy, RoomContract};

    use super::*;

    fn owner() -> AgentId {
        AgentId::new(7)
    }

    fn priced() -> PricedResult {
        let check_in = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        let rate = DailyRate::new(
            check_in,
            check_in + chrono::Days::new(1),
            Money::from_minor(10000, Currency::Usd),
            Money::from_minor(9000, Currency::Usd),
        );
        let room = RoomContract::new("Twin", BoardBasis::BedAndBreakfast, Occupancy::adults(2), vec![rate], Currency::Usd);
        let sets = (0..2)
            .map(|_| {
                RoomContractSet::new(
                    RoomContractSetId::new(),
                    vec![room.clone()],
                    Deadline::default(),
                    false,
                    Currency::Usd,
                )
            })
            .collect();
        PricedResult {
            result: AvailabilityResult {
                id: ResultId::new(),
                accommodation: Accommodation {
                    id: "acc-7".to_string(),
                    name: "Harbour Inn".to_string(),
                    country_code: "GB".to_string(),
                },
                timestamp: Utc::now(),
                check_in,
                check_out: check_in + chrono::Days::new(1),
                room_contract_sets: sets,
            },
            applied_markups: Vec::new(),
        }
    }

    #[test]
    fn every_set_of_a_result_is_cached() {
        let cache = BookingEvaluationCache::new(Duration::from_secs(60));
        let priced = priced();
        let search_id = SearchId::new();
        cache.set_result(search_id, Supplier::Illusions, owner(), &priced);

        assert_eq!(cache.len(), 2);
        for set in &priced.result.room_contract_sets {
            let key = EvaluationKey::new(search_id, priced.result.id, set.id);
            let offer = cache.get(&key, owner(), &[Supplier::Illusions]).unwrap();
            assert_eq!(offer.room_contract_set, *set);
            assert_eq!(offer.supplier, Supplier::Illusions);
        }
    }

    #[test]
    fn reads_do_not_consume_entries() {
        let cache = BookingEvaluationCache::new(Duration::from_secs(60));
        let priced = priced();
        let search_id = SearchId::new();
        cache.set_result(search_id, Supplier::Etg, owner(), &priced);

        let key = EvaluationKey::new(search_id, priced.result.id, priced.result.room_contract_sets[0].id);
        assert!(cache.get(&key, owner(), &[Supplier::Etg]).is_ok());
        assert!(cache.get(&key, owner(), &[Supplier::Etg]).is_ok());
    }

    #[test]
    fn disabled_supplier_reads_as_missing() {
        let cache = BookingEvaluationCache::new(Duration::from_secs(60));
        let priced = priced();
        let search_id = SearchId::new();
        cache.set_result(search_id, Supplier::Etg, owner(), &priced);

        let key = EvaluationKey::new(search_id, priced.result.id, priced.result.room_contract_sets[0].id);
        assert!(matches!(
            cache.get(&key, owner(), &[Supplier::Illusions]),
            Err(SearchError::OfferNotFound)
        ));
    }

    #[test]
    fn offers_are_only_visible_to_the_agent_they_were_returned_to() {
        let cache = BookingEvaluationCache::new(Duration::from_secs(60));
        let priced = priced();
        let search_id = SearchId::new();
        cache.set_result(search_id, Supplier::Etg, owner(), &priced);

        let key = EvaluationKey::new(search_id, priced.result.id, priced.result.room_contract_sets[0].id);
        assert!(matches!(
            cache.get(&key, AgentId::new(8), &[Supplier::Etg]),
            Err(SearchError::OfferNotFound)
        ));
        assert!(cache.get(&key, owner(), &[Supplier::Etg]).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = BookingEvaluationCache::new(Duration::from_secs(900));
        let priced = priced();
        let search_id = SearchId::new();
        cache.set_result(search_id, Supplier::Etg, owner(), &priced);
        let key = EvaluationKey::new(search_id, priced.result.id, priced.result.room_contract_sets[0].id);

        tokio::time::advance(Duration::from_secs(901)).await;

        assert!(matches!(cache.get(&key, owner(), &[Supplier::Etg]), Err(SearchError::OfferNotFound)));
    }
}
