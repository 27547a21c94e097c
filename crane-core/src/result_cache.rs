use crate::Result;
use anyhow::anyhow;
use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, sync::Arc};
use time::{Duration, OffsetDateTime};

/// Cached item, type erased.
pub type CacheItem = Arc<dyn Any + Send + Sync>;

/// Storage of query results by caller chosen key.
pub trait ResultCache: Send + Sync {
    /// Item stored under `key`, `None` when absent or expired.
    fn get(&self, key: &str) -> Option<CacheItem>;
    /// Stores `item` for `expiration_minutes`. An existing live item is replaced unless `throw_if_exists`, which
    /// fails instead.
    fn add(
        &self,
        key: &str,
        item: CacheItem,
        expiration_minutes: u64,
        throw_if_exists: bool,
    ) -> Result<()>;
    fn remove(&self, key: &str) -> Option<CacheItem>;
    fn clear(&self);
}

struct Entry {
    item: CacheItem,
    expiration: OffsetDateTime,
}

impl Entry {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration <= now
    }
}

/// Process memory [`ResultCache`], expired items are dropped when looked up.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn len(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        self.entries
            .read()
            .values()
            .filter(|v| !v.is_expired(now))
            .count()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheItem> {
        let now = OffsetDateTime::now_utc();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.item.clone()),
                Some(..) => {}
                None => return None,
            }
        }
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|v| v.is_expired(now)) {
            log::debug!("Cached item `{key}` expired");
            entries.remove(key);
        }
        None
    }

    fn add(
        &self,
        key: &str,
        item: CacheItem,
        expiration_minutes: u64,
        throw_if_exists: bool,
    ) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.write();
        if throw_if_exists && entries.get(key).is_some_and(|v| !v.is_expired(now)) {
            return Err(anyhow!("An item is already cached under `{key}`"));
        }
        let minutes = i64::try_from(expiration_minutes)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 60);
        let expiration = now
            .checked_add(Duration::minutes(minutes))
            .unwrap_or(time::PrimitiveDateTime::MAX.assume_utc());
        entries.insert(key.to_string(), Entry { item, expiration });
        Ok(())
    }

    fn remove(&self, key: &str) -> Option<CacheItem> {
        self.entries.write().remove(key).map(|v| v.item)
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}
