//! Bounded, expiring map of snapshot sources.
//!
//! Providers keep one [`SnapshotSource`] per key they resolve. The map holds
//! at most `capacity` keys (least recently used goes first) and reports an
//! entry as [`Lookup::Stale`] once its resolution is older than `ttl`, so
//! callers re-resolve it instead of serving it forever.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use lru::LruCache;

use crate::snapshot::{Snapshot, SnapshotSource};

/// Size and age limits of a [`SnapshotCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub capacity: NonZeroUsize,
    pub ttl: Duration,
}

impl CacheLimits {
    pub const DEFAULT_CAPACITY: usize = 1024;
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(Self::DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ttl: Self::DEFAULT_TTL,
        }
    }
}

/// How [`SnapshotCache::lookup`] found its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Cached and recent enough; nothing to do.
    Fresh,
    /// Not cached; a pending source was inserted.
    Created,
    /// Cached but outdated; the caller should start a new generation.
    Stale,
}

struct Entry<T> {
    source: Arc<SnapshotSource<T>>,
    started_at: SystemTime,
}

pub struct SnapshotCache<K, T> {
    ttl: Duration,
    entries: Mutex<LruCache<K, Entry<T>>>,
}

impl<K, T> SnapshotCache<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone + Send + Sync,
{
    pub fn new(limits: CacheLimits) -> Self {
        Self {
            ttl: limits.ttl,
            entries: Mutex::new(LruCache::new(limits.capacity)),
        }
    }

    /// Source for `key`.
    ///
    /// An entry is stale when its last resolution started more than `ttl`
    /// ago, or before `not_before` (e.g. the issue time of a newer token).
    /// Stale and created entries are stamped with the current time.
    pub fn lookup(&self, key: &K, not_before: Option<SystemTime>) -> (Arc<SnapshotSource<T>>, Lookup) {
        let now = SystemTime::now();
        let ttl = self.ttl;
        self.entry(key, now, |entry| {
            let expired = now
                .duration_since(entry.started_at)
                .is_ok_and(|age| age >= ttl);
            expired || not_before.is_some_and(|t| entry.started_at < t)
        })
    }

    /// Source for `key`, always reported as needing a new resolution.
    pub fn renew(&self, key: &K) -> Arc<SnapshotSource<T>> {
        self.entry(key, SystemTime::now(), |_| true).0
    }

    /// Remove `key` if it still maps to `source`.
    ///
    /// A source that was already replaced (renewed key, eviction, removal)
    /// leaves the newer entry alone.
    pub fn evict(&self, key: &K, source: &Arc<SnapshotSource<T>>) -> bool {
        let mut entries = self.lock();
        let current = entries
            .peek(key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.source, source));
        if current {
            entries.pop(key);
        }
        current
    }

    pub fn remove(&self, key: &K) -> bool {
        self.lock().pop(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn entry<F>(&self, key: &K, now: SystemTime, is_stale: F) -> (Arc<SnapshotSource<T>>, Lookup)
    where
        F: FnOnce(&Entry<T>) -> bool,
    {
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(key) {
            if is_stale(entry) {
                entry.started_at = now;
                return (entry.source.clone(), Lookup::Stale);
            }
            return (entry.source.clone(), Lookup::Fresh);
        }

        let source = Arc::new(SnapshotSource::new(Snapshot::pending()));
        let entry = Entry {
            source: source.clone(),
            started_at: now,
        };
        if entries.push(key.clone(), entry).is_some() {
            tracing::debug!(capacity = entries.cap().get(), "snapshot cache full; evicted least recently used entry");
        }
        (source, Lookup::Created)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, Entry<T>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
