//! Offer trees and price processing.

mod prices;
mod tree;

pub use prices::{PriceTree, process_prices};
pub use tree::{
    Accommodation, AvailabilityResult, BoardBasis, CancellationPolicy, DailyRate, Deadline, Occupancy, Price,
    RoomContract, RoomContractSet,
};
