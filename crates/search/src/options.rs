use std::time::Duration;

/// Tuning for the search orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Budget for one supplier's availability call.
    pub supplier_timeout: Duration,
    /// How long priced offers stay bookable.
    pub evaluation_ttl: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            supplier_timeout: Duration::from_millis(5000),
            evaluation_ttl: Duration::from_secs(900),
        }
    }
}
