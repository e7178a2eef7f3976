//! Snapshot Cache
//! Mission: Serve the hot inventory listing without hitting the database

use parking_lot::RwLock;
use std::time::{Duration, Instant};

struct Slot<T> {
    value: T,
    deadline: Instant,
}

/// Single-slot cache with a fixed TTL and eager invalidation.
///
/// There is exactly one slot because the listing it caches is global and
/// unfiltered. Concurrent misses may both fill the slot (last write wins,
/// both carry equivalent data); no single-flight guarantee is made.
/// Mutations call [`SnapshotCache::invalidate`] so the next read is always
/// a miss, regardless of remaining TTL.
pub struct SnapshotCache<T> {
    slot: RwLock<Option<Slot<T>>>,
    ttl: Duration,
}

impl<T: Clone> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    /// Returns the cached value if present and unexpired.
    pub fn get(&self) -> Option<T> {
        let guard = self.slot.read();
        match guard.as_ref() {
            Some(slot) if Instant::now() < slot.deadline => Some(slot.value.clone()),
            _ => None,
        }
    }

    /// Stores a fresh value, resetting the deadline to now + TTL.
    pub fn set(&self, value: T) {
        let slot = Slot {
            value,
            deadline: Instant::now() + self.ttl,
        };
        *self.slot.write() = Some(slot);
    }

    /// Unconditionally clears the slot. Safe to race with a concurrent fill.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}
