//! Price processing over offer trees.
//!
//! Only leaf amounts (daily gross and net) go through the transform. Room
//! totals and set prices are rebuilt from the transformed leaves, so
//! processing with `f` and then `g` is the same as processing once with
//! `g ∘ f`, and processing with the identity leaves the tree unchanged.

use common::Money;

use super::tree::{AvailabilityResult, DailyRate, Price, RoomContract, RoomContractSet};

/// A node of an offer tree whose prices can be rewritten.
pub trait PriceTree: Sized {
    fn map_prices<F>(self, f: &F) -> Self
    where
        F: Fn(Money) -> Money;
}

/// Applies `f` to every leaf price of `tree`, preserving all non-price fields.
pub fn process_prices<T, F>(tree: T, f: F) -> T
where
    T: PriceTree,
    F: Fn(Money) -> Money,
{
    tree.map_prices(&f)
}

fn map_price<F>(price: Price, f: &F) -> Price
where
    F: Fn(Money) -> Money,
{
    Price::new(f(price.gross), f(price.net))
}

impl PriceTree for DailyRate {
    fn map_prices<F>(self, f: &F) -> Self
    where
        F: Fn(Money) -> Money,
    {
        DailyRate {
            gross: f(self.gross),
            net: f(self.net),
            ..self
        }
    }
}

impl PriceTree for RoomContract {
    fn map_prices<F>(self, f: &F) -> Self
    where
        F: Fn(Money) -> Money,
    {
        // Empty rooms keep a zero total that still follows the currency change.
        let empty_total = map_price(self.total(), f);
        let RoomContract {
            room_type,
            board_basis,
            occupancy,
            daily_rates,
            ..
        } = self;
        let daily_rates = daily_rates.into_iter().map(|rate| rate.map_prices(f)).collect();
        RoomContract::rebuild(room_type, board_basis, occupancy, daily_rates, empty_total)
    }
}

impl PriceTree for RoomContractSet {
    fn map_prices<F>(self, f: &F) -> Self
    where
        F: Fn(Money) -> Money,
    {
        let empty_price = map_price(self.price(), f);
        let RoomContractSet {
            id,
            deadline,
            is_advance_purchase_rate,
            rooms,
            ..
        } = self;
        let rooms = rooms.into_iter().map(|room| room.map_prices(f)).collect();
        RoomContractSet::rebuild(id, rooms, deadline, is_advance_purchase_rate, empty_price)
    }
}

impl PriceTree for AvailabilityResult {
    fn map_prices<F>(self, f: &F) -> Self
    where
        F: Fn(Money) -> Money,
    {
        AvailabilityResult {
            room_contract_sets: self
                .room_contract_sets
                .into_iter()
                .map(|set| set.map_prices(f))
                .collect(),
            ..self
        }
    }
}

impl<T: PriceTree> PriceTree for Vec<T> {
    fn map_prices<F>(self, f: &F) -> Self
    where
        F: Fn(Money) -> Money,
    {
        self.into_iter().map(|node| node.map_prices(f)).collect()
    }
}
