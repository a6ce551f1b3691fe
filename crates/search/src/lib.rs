//! Wide availability search for the booking core.
//!
//! This crate provides:
//! - [`WideAvailabilitySearchOrchestrator`]: per-supplier fan-out with
//!   timeouts, partial state and merged results
//! - [`PriceProcessor`]: currency conversion, markup and rounding of
//!   supplier results
//! - [`DuplicateRegistry`]: agent reports of the same property offered by
//!   several suppliers
//! - [`BookingEvaluationCache`]: priced offers kept bookable for a TTL

pub mod duplicates;
pub mod error;
pub mod evaluation;
pub mod options;
pub mod orchestrator;
pub mod pricing;
pub mod results;
pub mod state;

pub use duplicates::{DuplicateIndex, DuplicateRegistry};
pub use error::{Result, SearchError};
pub use evaluation::{BookingEvaluationCache, CachedOffer, EvaluationKey};
pub use options::SearchOptions;
pub use orchestrator::WideAvailabilitySearchOrchestrator;
pub use pricing::{OfferPricer, PriceProcessor, PricedResult};
pub use results::{WideAvailabilityResult, merge_results};
pub use state::{SearchState, SearchStatus, SupplierSearchState, SupplierSearchStatus};
