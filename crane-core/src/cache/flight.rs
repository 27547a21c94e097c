use crate::{CacheStats, Result};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::HashMap,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Unbounded map building each missing entry exactly once.
///
/// Readers take the shared lock only. A miss locks the slot of its key: the first caller builds while the others
/// wait on the slot, then find the stored entry. A failed build stores nothing and the next caller retries.
/// Builds are synchronous and must not look up the same key of the same map.
///
/// Every flush starts a new generation. A build started before a flush returns its value to its caller but does
/// not store it.
pub(crate) struct FlightMap<K, V> {
    entries: RwLock<HashMap<K, V>>,
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    generation: AtomicU64,
    hits: AtomicU64,
    builds: AtomicU64,
}

impl<K: Eq + Hash + Clone, V: Clone> FlightMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Default::default(),
            slots: Default::default(),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let result = self.entries.read().get(key).cloned();
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    pub fn get_or_try_build(&self, key: &K, build: impl FnOnce() -> Result<V>) -> Result<V> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let slot = self.slots.lock().entry(key.clone()).or_default().clone();
        let guard = slot.lock();
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let generation = self.generation.load(Ordering::Acquire);
        let result = build();
        if let Ok(value) = &result {
            self.builds.fetch_add(1, Ordering::Relaxed);
            let mut entries = self.entries.write();
            if self.generation.load(Ordering::Acquire) == generation {
                entries.insert(key.clone(), value.clone());
            } else {
                log::debug!("Flushed while building, the entry is not stored");
            }
        }
        drop(guard);
        result
    }

    /// Stores `value` in place of the current entry.
    pub fn replace(&self, key: K, value: V) -> V {
        self.entries.write().insert(key, value.clone());
        value
    }

    pub fn flush(&self) {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
        self.slots.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for FlightMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
