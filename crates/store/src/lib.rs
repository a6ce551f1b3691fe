//! Keyed persistence primitives for the booking core.
//!
//! - [`KeyedStore`]: single-row reads and version-checked updates
//! - [`Journal`]: append-only event streams
//! - [`Numerator`]: monotonic named counters
//! - [`TtlCache`]: concurrent cache with per-entry expiry
//! - [`EntityLocker`]: named locks with bounded token lifetime

pub mod error;
pub mod journal;
pub mod keyed;
pub mod lock;
pub mod sequence;
pub mod ttl;
pub mod version;

pub use error::{Result, StoreError};
pub use journal::{InMemoryJournal, Journal, JournalEntry};
pub use keyed::{InMemoryStore, KeyedStore, ScanFilter, Versioned};
pub use lock::{EntityLockGuard, EntityLocker, LockOptions};
pub use sequence::{InMemoryNumerator, Numerator};
pub use ttl::{CacheStats, TtlCache};
pub use version::Version;
