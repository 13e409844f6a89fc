//! Bounded expire-after-access cache.
//!
//! Backs the in-memory challenge and session stores. Entries expire once
//! they have not been accessed for `ttl`; when the cache holds more than
//! `capacity` entries the least recently accessed ones are evicted.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct Slot<V> {
    value: V,
    last_access: Instant,
    /// Monotonic access sequence; orders entries whose instants tie.
    tick: u64,
}

pub(crate) struct ExpiringCache<K, V> {
    entries: DashMap<K, Slot<V>>,
    capacity: usize,
    ttl: Duration,
    ticks: AtomicU64,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // ---
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        // ---
        Self {
            entries: DashMap::with_capacity(capacity.min(1024)),
            capacity,
            ttl,
            ticks: AtomicU64::new(0),
        }
    }

    fn next_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed)
    }

    fn is_live(ttl: Duration, slot: &Slot<V>, now: Instant) -> bool {
        now.saturating_duration_since(slot.last_access) < ttl
    }

    /// Inserts under a key that must not hold a live entry.
    ///
    /// Returns false, leaving the existing entry untouched, on collision.
    pub fn insert_new(&self, key: K, value: V) -> bool {
        // ---
        let now = Instant::now();
        let slot = Slot {
            value,
            last_access: now,
            tick: self.next_tick(),
        };

        // Entry guard is released at the end of the match, before eviction.
        let inserted = match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if Self::is_live(self.ttl, occupied.get(), now) {
                    false
                } else {
                    occupied.insert(slot);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                true
            }
        };

        if inserted {
            self.evict(now);
        }
        inserted
    }

    /// Returns a clone of a live entry and refreshes its access time.
    pub fn get(&self, key: &K) -> Option<V> {
        // ---
        let now = Instant::now();
        let ttl = self.ttl;

        let value = {
            let mut slot = self.entries.get_mut(key)?;
            if Self::is_live(ttl, &slot, now) {
                slot.last_access = now;
                slot.tick = self.next_tick();
                Some(slot.value.clone())
            } else {
                None
            }
        };

        if value.is_none() {
            self.entries
                .remove_if(key, |_, slot| !Self::is_live(ttl, slot, now));
        }
        value
    }

    /// Removes the entry and returns it if it was still live.
    ///
    /// Removal is a single map operation, so concurrent callers for the same
    /// key can observe the value at most once between them.
    pub fn take(&self, key: &K) -> Option<V> {
        // ---
        let now = Instant::now();
        let (_, slot) = self.entries.remove(key)?;
        Self::is_live(self.ttl, &slot, now).then_some(slot.value)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn evict(&self, now: Instant) {
        // ---
        let ttl = self.ttl;
        self.entries
            .retain(|_, slot| Self::is_live(ttl, slot, now));

        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().tick)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
