//! Keyed row store with optimistic concurrency.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{Result, StoreError, Version};

/// A stored value together with its write version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<V> {
    pub value: V,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

/// Predicate used by [`KeyedStore::scan`].
pub type ScanFilter<'a, K, V> = &'a (dyn Fn(&K, &V) -> bool + Send + Sync);

/// Row store keyed by `K`.
///
/// Updates are single-row and guarded by the version read beforehand; a
/// mismatch surfaces as [`StoreError::ConcurrencyConflict`] and nothing is
/// written. Rows are never deleted.
#[async_trait]
pub trait KeyedStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<Versioned<V>>>;

    /// Inserts a new row at [`Version::first`].
    async fn insert(&self, key: K, value: V) -> Result<Version>;

    /// Replaces the row if its version still equals `expected`.
    async fn update(&self, key: &K, value: V, expected: Version) -> Result<Version>;

    /// Returns all rows matching the filter, ordered by key.
    async fn scan(&self, filter: ScanFilter<'_, K, V>) -> Result<Vec<(K, Versioned<V>)>>;
}

/// In-memory [`KeyedStore`] for tests and single-process deployments.
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    rows: Arc<RwLock<HashMap<K, Versioned<V>>>>,
}

impl<K, V> Clone for InMemoryStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl<K, V> KeyedStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Ord + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<Versioned<V>>> {
        Ok(self.rows.read().await.get(key).cloned())
    }

    async fn insert(&self, key: K, value: V) -> Result<Version> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }

        rows.insert(
            key,
            Versioned {
                value,
                version: Version::first(),
                updated_at: Utc::now(),
            },
        );
        Ok(Version::first())
    }

    async fn update(&self, key: &K, value: V, expected: Version) -> Result<Version> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        if row.version != expected {
            tracing::debug!(%key, %expected, actual = %row.version, "rejected stale update");
            return Err(StoreError::ConcurrencyConflict {
                key: key.to_string(),
                expected,
                actual: row.version,
            });
        }

        row.value = value;
        row.version = row.version.next();
        row.updated_at = Utc::now();
        Ok(row.version)
    }

    async fn scan(&self, filter: ScanFilter<'_, K, V>) -> Result<Vec<(K, Versioned<V>)>> {
        let rows = self.rows.read().await;
        let mut matches: Vec<_> = rows
            .iter()
            .filter(|(key, row)| filter(key, &row.value))
            .map(|(key, row)| (key.clone(), row.clone()))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matches)
    }
}
