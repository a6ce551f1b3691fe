//! Monotonic named counters.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::Result;

/// Source of monotonically increasing numbers per counter name.
#[async_trait]
pub trait Numerator: Send + Sync {
    /// Returns the next value of the named counter, starting at 1.
    async fn next(&self, name: &str) -> Result<i64>;

    /// Returns the last issued value, 0 if none was issued.
    async fn current(&self, name: &str) -> Result<i64>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryNumerator {
    counters: Arc<DashMap<String, i64>>,
}

impl InMemoryNumerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Numerator for InMemoryNumerator {
    async fn next(&self, name: &str) -> Result<i64> {
        let mut counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn current(&self, name: &str) -> Result<i64> {
        Ok(self.counters.get(name).map(|value| *value).unwrap_or(0))
    }
}
