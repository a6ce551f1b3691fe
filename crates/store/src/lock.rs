//! Named entity locks with bounded token lifetime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{Result, StoreError};

/// Timing options for [`EntityLocker`].
#[derive(Debug, Clone, Copy)]
pub struct LockOptions {
    /// How long a token stays valid. An expired token may be taken over,
    /// so a crashed holder never blocks a key forever.
    pub token_ttl: Duration,
    /// How long `acquire` keeps retrying before giving up.
    pub acquire_timeout: Duration,
    pub retry_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(10),
            retry_interval: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LockToken {
    owner: Uuid,
    expires_at: Instant,
}

type LockTable = Arc<Mutex<HashMap<String, LockToken>>>;

/// At most one holder per `(entity, key)` at a time.
#[derive(Debug, Clone, Default)]
pub struct EntityLocker {
    tokens: LockTable,
    options: LockOptions,
}

/// Held lock. Released when dropped, unless the token already expired and
/// was taken over by another holder.
#[derive(Debug)]
pub struct EntityLockGuard {
    tokens: LockTable,
    name: String,
    owner: Uuid,
}

impl Drop for EntityLockGuard {
    fn drop(&mut self) {
        let mut tokens = self.tokens.lock();
        if tokens
            .get(&self.name)
            .is_some_and(|token| token.owner == self.owner)
        {
            tokens.remove(&self.name);
        }
    }
}

impl EntityLocker {
    pub fn new(options: LockOptions) -> Self {
        Self {
            tokens: Arc::default(),
            options,
        }
    }

    fn lock_name(entity: &str, key: &str) -> String {
        format!("{entity}::{key}")
    }

    /// Tries once to take the lock.
    pub fn try_acquire(&self, entity: &str, key: &str) -> Option<EntityLockGuard> {
        let name = Self::lock_name(entity, key);
        let now = Instant::now();
        let mut tokens = self.tokens.lock();

        if let Some(existing) = tokens.get(&name)
            && existing.expires_at > now
        {
            return None;
        }

        if tokens.contains_key(&name) {
            tracing::warn!(lock = %name, "taking over expired entity lock");
            metrics::counter!("entity_lock_takeovers_total").increment(1);
        }

        let owner = Uuid::new_v4();
        tokens.insert(
            name.clone(),
            LockToken {
                owner,
                expires_at: now + self.options.token_ttl,
            },
        );

        Some(EntityLockGuard {
            tokens: Arc::clone(&self.tokens),
            name,
            owner,
        })
    }

    /// Waits for the lock, retrying until `acquire_timeout` elapses.
    pub async fn acquire(&self, entity: &str, key: &str) -> Result<EntityLockGuard> {
        let started = Instant::now();
        loop {
            if let Some(guard) = self.try_acquire(entity, key) {
                return Ok(guard);
            }

            let waited = started.elapsed();
            if waited >= self.options.acquire_timeout {
                return Err(StoreError::LockTimeout {
                    entity: entity.to_string(),
                    key: key.to_string(),
                    waited_ms: waited.as_millis(),
                });
            }
            tokio::time::sleep(self.options.retry_interval).await;
        }
    }

    /// Runs `operation` while holding the lock for `(entity, key)`.
    pub async fn run_locked<T, E, F, Fut>(&self, entity: &str, key: &str, operation: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<StoreError>,
    {
        let _guard = self.acquire(entity, key).await?;
        operation().await
    }

    /// Returns true if a live token exists for `(entity, key)`.
    pub fn is_locked(&self, entity: &str, key: &str) -> bool {
        let name = Self::lock_name(entity, key);
        self.tokens
            .lock()
            .get(&name)
            .is_some_and(|token| token.expires_at > Instant::now())
    }
}
