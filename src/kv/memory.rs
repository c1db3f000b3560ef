use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{KvEngine, KvEntry, Versionstamp};
use crate::error::Result;

static REGISTRY: LazyLock<Mutex<HashMap<String, Arc<MemoryKv>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

const DEFAULT_PATH: &str = "";

/// Writes between sweeps of expired entries.
const PURGE_EVERY_WRITES: u64 = 1024;

#[derive(Debug)]
struct StoredValue {
    value: Value,
    versionstamp: Versionstamp,
    deadline: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| deadline > now)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, StoredValue>,
    next_versionstamp: Versionstamp,
    writes_since_purge: u64,
}

impl Inner {
    fn live(&mut self, key: &str, now: Instant) -> Option<&StoredValue> {
        if self.entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }

    fn purge(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        self.writes_since_purge = 0;
        before - self.entries.len()
    }

    fn write(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> Versionstamp {
        self.writes_since_purge += 1;
        if self.writes_since_purge >= PURGE_EVERY_WRITES {
            let purged = self.purge(Instant::now());
            if purged > 0 {
                tracing::debug!(purged, "purged expired memory kv entries");
            }
        }

        self.next_versionstamp += 1;
        let versionstamp = self.next_versionstamp;
        self.entries.insert(
            key.to_owned(),
            StoredValue {
                value,
                versionstamp,
                deadline: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        versionstamp
    }
}

/// In-process [`KvEngine`] with per-entry TTL.
///
/// Expired entries are never returned. They are dropped when their key is next touched, by a
/// sweep every `PURGE_EVERY_WRITES` writes, or when [`MemoryKv::purge_expired`] runs.
#[derive(Debug, Default)]
pub struct MemoryKv {
    inner: Mutex<Inner>,
}

impl MemoryKv {
    /// A private store, not shared through [`MemoryKv::open`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the store registered under `path`, or to the process-wide default
    /// store when `path` is `None`. The store is created on first open.
    pub fn open(path: Option<&str>) -> Arc<Self> {
        let path = path.unwrap_or(DEFAULT_PATH);
        REGISTRY
            .lock()
            .entry(path.to_owned())
            .or_insert_with(|| {
                tracing::debug!(path, "opening memory kv store");
                Arc::new(Self::new())
            })
            .clone()
    }

    /// Drops the registry's handle for `path`. Outstanding handles keep working; the next
    /// `open` of the same path starts from an empty store.
    pub fn close(path: Option<&str>) {
        let path = path.unwrap_or(DEFAULT_PATH);
        if REGISTRY.lock().remove(path).is_some() {
            tracing::debug!(path, "closed memory kv store");
        }
    }

    /// Number of entries currently held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry now instead of waiting for the next periodic sweep.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge(Instant::now())
    }
}

#[async_trait]
impl KvEngine for MemoryKv {
    async fn get(&self, key: &str) -> Result<KvEntry> {
        let mut inner = self.inner.lock();

        Ok(inner
            .live(key, Instant::now())
            .map(|entry| KvEntry {
                value: Some(entry.value.clone()),
                versionstamp: Some(entry.versionstamp),
            })
            .unwrap_or_default())
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<Versionstamp> {
        Ok(self.inner.lock().write(key, value, ttl))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.lock().entries.remove(key);
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<Option<Versionstamp>> {
        let mut inner = self.inner.lock();
        if inner.live(key, Instant::now()).is_some() {
            return Ok(None);
        }

        Ok(Some(inner.write(key, value, ttl)))
    }
}
