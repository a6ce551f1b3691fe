//! Offer tree: accommodation → room-contract-set → room contract → daily rate.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use common::{Currency, Decimal, Money, ResultId, RoomContractSetId};
use serde::{Deserialize, Serialize};

/// Gross and net amount of one price point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub gross: Money,
    pub net: Money,
}

impl Price {
    pub fn new(gross: Money, net: Money) -> Self {
        Self { gross, net }
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            gross: Money::zero(currency),
            net: Money::zero(currency),
        }
    }

    pub fn currency(&self) -> Currency {
        self.gross.currency
    }

    pub fn add(&self, other: Price) -> Price {
        Price {
            gross: self.gross.add(other.gross),
            net: self.net.add(other.net),
        }
    }

    /// Sums prices, falling back to `empty` when there are none.
    fn sum(prices: impl IntoIterator<Item = Price>, empty: Price) -> Price {
        let mut prices = prices.into_iter();
        match prices.next() {
            Some(first) => prices.fold(first, |total, price| total.add(price)),
            None => empty,
        }
    }
}

/// Price of one stay night range. The only level whose amounts are
/// transformed directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRate {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub gross: Money,
    pub net: Money,
    #[serde(default)]
    pub description: String,
}

impl DailyRate {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate, gross: Money, net: Money) -> Self {
        Self {
            from_date,
            to_date,
            gross,
            net,
            description: String::new(),
        }
    }

    pub fn price(&self) -> Price {
        Price::new(self.gross, self.net)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BoardBasis {
    #[default]
    RoomOnly,
    BedAndBreakfast,
    HalfBoard,
    FullBoard,
    AllInclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Occupancy {
    pub adults: u8,
    #[serde(default)]
    pub children_ages: Vec<u8>,
}

impl Occupancy {
    pub fn adults(adults: u8) -> Self {
        Self {
            adults,
            children_ages: Vec::new(),
        }
    }
}

/// One room of a room-contract-set. Its total is always the sum of its daily
/// rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomContract {
    pub room_type: String,
    pub board_basis: BoardBasis,
    pub occupancy: Occupancy,
    pub daily_rates: Vec<DailyRate>,
    total: Price,
}

impl RoomContract {
    pub fn new(
        room_type: impl Into<String>,
        board_basis: BoardBasis,
        occupancy: Occupancy,
        daily_rates: Vec<DailyRate>,
        currency: Currency,
    ) -> Self {
        let total = Price::sum(daily_rates.iter().map(DailyRate::price), Price::zero(currency));
        Self {
            room_type: room_type.into(),
            board_basis,
            occupancy,
            daily_rates,
            total,
        }
    }

    pub fn total(&self) -> Price {
        self.total
    }

    /// Rebuilds the total from already transformed rates. `empty_total` is
    /// only used when there are no rates.
    pub(crate) fn rebuild(
        room_type: String,
        board_basis: BoardBasis,
        occupancy: Occupancy,
        daily_rates: Vec<DailyRate>,
        empty_total: Price,
    ) -> Self {
        let total = Price::sum(daily_rates.iter().map(DailyRate::price), empty_total);
        Self {
            room_type,
            board_basis,
            occupancy,
            daily_rates,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationPolicy {
    pub from_date: DateTime<Utc>,
    /// Share of the total charged when cancelling from `from_date` on.
    pub percentage: Decimal,
}

/// Free-cancellation deadline of a room-contract-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Deadline {
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub policies: Vec<CancellationPolicy>,
    #[serde(default)]
    pub remarks: Vec<String>,
}

impl Deadline {
    pub fn at(date: DateTime<Utc>) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }
}

/// One bookable combination of rooms. Its price is always the sum of its
/// room totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomContractSet {
    pub id: RoomContractSetId,
    pub deadline: Deadline,
    pub is_advance_purchase_rate: bool,
    pub rooms: Vec<RoomContract>,
    price: Price,
}

impl RoomContractSet {
    pub fn new(
        id: RoomContractSetId,
        rooms: Vec<RoomContract>,
        deadline: Deadline,
        is_advance_purchase_rate: bool,
        currency: Currency,
    ) -> Self {
        Self::rebuild(id, rooms, deadline, is_advance_purchase_rate, Price::zero(currency))
    }

    pub(crate) fn rebuild(
        id: RoomContractSetId,
        rooms: Vec<RoomContract>,
        deadline: Deadline,
        is_advance_purchase_rate: bool,
        empty_price: Price,
    ) -> Self {
        let price = Price::sum(rooms.iter().map(RoomContract::total), empty_price);
        Self {
            id,
            deadline,
            is_advance_purchase_rate,
            rooms,
            price,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Accommodation {
    /// Supplier-side accommodation id.
    pub id: String,
    pub name: String,
    /// ISO 3166 alpha-2 country code.
    pub country_code: String,
}

/// One accommodation with its bookable room-contract-sets, as returned by a
/// single supplier for a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub id: ResultId,
    pub accommodation: Accommodation,
    /// When the supplier produced the result; orders results across suppliers.
    pub timestamp: DateTime<Utc>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_contract_sets: Vec<RoomContractSet>,
}

impl AvailabilityResult {
    pub fn room_contract_set(&self, id: RoomContractSetId) -> Option<&RoomContractSet> {
        self.room_contract_sets.iter().find(|set| set.id == id)
    }

    /// Lowest gross price among the room-contract-sets.
    pub fn min_price(&self) -> Option<Money> {
        self.room_contract_sets
            .iter()
            .map(|set| set.price().gross)
            .min_by(|a, b| a.amount.cmp(&b.amount))
    }

    /// Highest gross price among the room-contract-sets.
    pub fn max_price(&self) -> Option<Money> {
        self.room_contract_sets
            .iter()
            .map(|set| set.price().gross)
            .max_by(|a, b| a.amount.cmp(&b.amount))
    }

    /// Every currency used by a daily rate in the tree.
    pub fn currencies(&self) -> BTreeSet<Currency> {
        self.room_contract_sets
            .iter()
            .flat_map(|set| set.rooms.iter())
            .flat_map(|room| room.daily_rates.iter())
            .flat_map(|rate| [rate.gross.currency, rate.net.currency])
            .collect()
    }
}
