//! Merging supplier results into the list an agent reads.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use common::{Money, ResultId, Supplier};
use domain::{Accommodation, AvailabilityResult, RoomContractSet, SupplierAccommodationId};
use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicateIndex;

/// One accommodation in the merged search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideAvailabilityResult {
    pub id: ResultId,
    /// Only present when suppliers are visible to the agent.
    pub supplier: Option<Supplier>,
    pub accommodation: Accommodation,
    pub timestamp: DateTime<Utc>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_contract_sets: Vec<RoomContractSet>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Another supplier offered the same property and was dropped.
    pub has_duplicate: bool,
}

impl WideAvailabilityResult {
    fn new(supplier: Supplier, result: AvailabilityResult, supplier_visible: bool) -> Self {
        Self {
            id: result.id,
            supplier: supplier_visible.then_some(supplier),
            min_price: result.min_price(),
            max_price: result.max_price(),
            accommodation: result.accommodation,
            timestamp: result.timestamp,
            check_in: result.check_in,
            check_out: result.check_out,
            room_contract_sets: result.room_contract_sets,
            has_duplicate: false,
        }
    }
}

/// Orders `(supplier, result)` pairs and drops duplicates.
///
/// Pairs are sorted by result timestamp; equal timestamps keep supplier
/// order. A result reported as a duplicate of an earlier one is dropped and
/// the earlier result is flagged with `has_duplicate`.
pub fn merge_results(
    mut pairs: Vec<(Supplier, AvailabilityResult)>,
    duplicates: &DuplicateIndex,
    supplier_visible: bool,
) -> Vec<WideAvailabilityResult> {
    pairs.sort_by(|(left_supplier, left), (right_supplier, right)| {
        left.timestamp
            .cmp(&right.timestamp)
            .then_with(|| left_supplier.cmp(right_supplier))
    });

    let mut merged: Vec<WideAvailabilityResult> = Vec::with_capacity(pairs.len());
    let mut survivors: HashMap<i64, usize> = HashMap::new();
    for (supplier, result) in pairs {
        let key = SupplierAccommodationId::new(supplier, result.accommodation.id.clone());
        let reports = duplicates.reports_for(&key);

        if let Some(&survivor) = reports.iter().find_map(|report| survivors.get(report)) {
            merged[survivor].has_duplicate = true;
            continue;
        }

        let position = merged.len();
        for report in reports {
            survivors.insert(*report, position);
        }
        merged.push(WideAvailabilityResult::new(supplier, result, supplier_visible));
    }
    merged
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use common::{AgencyId, AgentContext, AgentId, CounterpartyId, Currency, RoomContractSetId};
    use domain::{BoardBasis, DailyRate, Deadline, Occupancy, RoomContract};

    use super::*;
    use crate::duplicates::DuplicateRegistry;

    fn result(accommodation_id: &str, second: u32, minor: &[i64]) -> AvailabilityResult {
        let check_in = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        let sets = minor
            .iter()
            .map(|amount| {
                let rate = DailyRate::new(
                    check_in,
                    check_in + chrono::Days::new(1),
                    Money::from_minor(*amount, Currency::Usd),
                    Money::from_minor(*amount, Currency::Usd),
                );
                let room = RoomContract::new("Double", BoardBasis::RoomOnly, Occupancy::adults(2), vec![rate], Currency::Usd);
                RoomContractSet::new(RoomContractSetId::new(), vec![room], Deadline::default(), false, Currency::Usd)
            })
            .collect();
        AvailabilityResult {
            id: ResultId::new(),
            accommodation: Accommodation {
                id: accommodation_id.to_string(),
                name: accommodation_id.to_uppercase(),
                country_code: "AE".to_string(),
            },
            timestamp: Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, second).unwrap(),
            check_in,
            check_out: check_in + chrono::Days::new(1),
            room_contract_sets: sets,
        }
    }

    fn agent() -> AgentContext {
        AgentContext::new(AgentId::new(1), AgencyId::new(1), CounterpartyId::new(1))
    }

    #[test]
    fn ordered_by_timestamp_then_supplier() {
        let merged = merge_results(
            vec![
                (Supplier::Rakuten, result("c", 5, &[100])),
                (Supplier::Illusions, result("b", 1, &[100])),
                (Supplier::Netstorming, result("a", 1, &[100])),
            ],
            &DuplicateIndex::default(),
            true,
        );

        let ids: Vec<&str> = merged.iter().map(|r| r.accommodation.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(merged[0].supplier, Some(Supplier::Netstorming));
    }

    #[test]
    fn later_duplicate_is_dropped_and_survivor_flagged() {
        let registry = DuplicateRegistry::new();
        let report = registry
            .report(
                &agent(),
                vec![
                    SupplierAccommodationId::new(Supplier::Etg, "etg-hotel"),
                    SupplierAccommodationId::new(Supplier::Illusions, "ill-hotel"),
                ],
            )
            .unwrap();
        registry.approve(report.id).unwrap();

        let merged = merge_results(
            vec![
                (Supplier::Illusions, result("ill-hotel", 9, &[150])),
                (Supplier::Etg, result("etg-hotel", 2, &[120])),
                (Supplier::Rakuten, result("other", 4, &[90])),
            ],
            &registry.index_for(&agent()),
            true,
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].accommodation.id, "etg-hotel");
        assert!(merged[0].has_duplicate);
        assert!(!merged[1].has_duplicate);
    }

    #[test]
    fn min_and_max_price_come_from_room_contract_sets() {
        let merged = merge_results(
            vec![(Supplier::Etg, result("a", 0, &[300, 100, 200]))],
            &DuplicateIndex::default(),
            false,
        );

        assert_eq!(merged[0].min_price, Some(Money::from_minor(100, Currency::Usd)));
        assert_eq!(merged[0].max_price, Some(Money::from_minor(300, Currency::Usd)));
        assert_eq!(merged[0].supplier, None);
    }
}
