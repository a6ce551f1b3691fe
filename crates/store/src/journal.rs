//! Append-only journals keyed by stream name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{Result, StoreError, Version};

/// One recorded entry of a journal stream.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry<E> {
    pub stream: String,
    pub version: Version,
    pub recorded_at: DateTime<Utc>,
    pub event: E,
}

/// Append-only, per-stream event log.
#[async_trait]
pub trait Journal<E>: Send + Sync
where
    E: Send + Sync + 'static,
{
    /// Appends events to a stream.
    ///
    /// When `expected` is set, the stream's current version must equal it.
    /// Returns the version of the last appended event.
    async fn append(&self, stream: &str, events: Vec<E>, expected: Option<Version>) -> Result<Version>;

    /// Reads a whole stream in version order.
    async fn read(&self, stream: &str) -> Result<Vec<JournalEntry<E>>>;

    /// Current version of a stream, [`Version::initial`] when empty.
    async fn version(&self, stream: &str) -> Result<Version>;
}

/// In-memory [`Journal`].
#[derive(Debug)]
pub struct InMemoryJournal<E> {
    streams: Arc<RwLock<HashMap<String, Vec<JournalEntry<E>>>>>,
}

impl<E> Clone for InMemoryJournal<E> {
    fn clone(&self) -> Self {
        Self {
            streams: Arc::clone(&self.streams),
        }
    }
}

impl<E> Default for InMemoryJournal<E> {
    fn default() -> Self {
        Self {
            streams: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<E> InMemoryJournal<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all streams.
    pub async fn entry_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl<E> Journal<E> for InMemoryJournal<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn append(&self, stream: &str, events: Vec<E>, expected: Option<Version>) -> Result<Version> {
        let mut streams = self.streams.write().await;
        let entries = streams.entry(stream.to_string()).or_default();

        let current = entries
            .last()
            .map(|entry| entry.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = expected
            && current != expected
        {
            return Err(StoreError::ConcurrencyConflict {
                key: stream.to_string(),
                expected,
                actual: current,
            });
        }

        let mut version = current;
        let recorded_at = Utc::now();
        for event in events {
            version = version.next();
            entries.push(JournalEntry {
                stream: stream.to_string(),
                version,
                recorded_at,
                event,
            });
        }

        Ok(version)
    }

    async fn read(&self, stream: &str) -> Result<Vec<JournalEntry<E>>> {
        Ok(self
            .streams
            .read()
            .await
            .get(stream)
            .cloned()
            .unwrap_or_default())
    }

    async fn version(&self, stream: &str) -> Result<Version> {
        Ok(self
            .streams
            .read()
            .await
            .get(stream)
            .and_then(|entries| entries.last())
            .map(|entry| entry.version)
            .unwrap_or(Version::initial()))
    }
}
