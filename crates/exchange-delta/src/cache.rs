//! Single-slot TTL cache for high-frequency, low-volatility endpoints.
//!
//! Market data is not user-specific, so each endpoint gets one global slot
//! per client instance. Invalidation is purely time-based; a stale value is
//! kept around so it can still be served when the upstream fetch fails.

use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// One cached value with its fill time.
#[derive(Debug)]
struct Slot<T> {
    value: T,
    filled_at: Instant,
}

/// A single-slot cache with a fixed TTL.
///
/// Writers race benignly: cached values are idempotent fetches of the same
/// upstream truth, so last-writer-wins is acceptable.
#[derive(Debug)]
pub struct TtlCache<T> {
    slot: RwLock<Option<Slot<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    /// Returns the cached value if it is still within the TTL.
    #[must_use]
    pub fn get_fresh(&self) -> Option<T> {
        let slot = self.slot.read();
        slot.as_ref()
            .filter(|s| s.filled_at.elapsed() < self.ttl)
            .map(|s| s.value.clone())
    }

    /// Returns the last cached value regardless of age, for serving stale
    /// data when the upstream is failing.
    #[must_use]
    pub fn get_stale(&self) -> Option<T> {
        self.slot.read().as_ref().map(|s| s.value.clone())
    }

    /// Stores a freshly fetched value.
    pub fn put(&self, value: T) {
        *self.slot.write() = Some(Slot {
            value,
            filled_at: Instant::now(),
        });
    }
}
