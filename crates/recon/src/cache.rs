// Memoized entity loads keyed by (entity, tier)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use devintel_core::{Entity, Tier};
use parking_lot::Mutex;

use crate::loader::LoadedEntity;

/// When a cached load stops being served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// `None` keeps entries until [`EntityCache::invalidate`] or [`EntityCache::clear`].
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }
}

struct CacheEntry {
    loaded_at: Instant,
    value: Arc<LoadedEntity>,
}

/// Cache of loaded entities. Source files are treated as immutable while an
/// entry is live, so a newly dropped export is seen only after expiry or an
/// explicit clear.
pub struct EntityCache {
    policy: CachePolicy,
    entries: Mutex<HashMap<(Entity, Tier), CacheEntry>>,
}

impl EntityCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Return the live entry for `(entity, tier)`, or run `load` and store it.
    ///
    /// The lock is not held while `load` runs.
    pub fn get_or_load<F>(&self, entity: &Entity, tier: Tier, load: F) -> Arc<LoadedEntity>
    where
        F: FnOnce() -> LoadedEntity,
    {
        let key = (entity.clone(), tier);
        if let Some(hit) = self.live(&key) {
            log::debug!("cache hit: {entity} ({tier})");
            return hit;
        }

        let value = Arc::new(load());
        self.entries.lock().insert(
            key,
            CacheEntry {
                loaded_at: Instant::now(),
                value: Arc::clone(&value),
            },
        );
        value
    }

    fn live(&self, key: &(Entity, Tier)) -> Option<Arc<LoadedEntity>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => self
                .policy
                .ttl
                .is_some_and(|ttl| entry.loaded_at.elapsed() >= ttl),
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| Arc::clone(&e.value))
    }

    /// Drop every tier's entry for `entity`.
    pub fn invalidate(&self, entity: &Entity) {
        self.entries.lock().retain(|(e, _), _| e != entity);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}
