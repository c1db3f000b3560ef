//! Key-value engine contract used by [`KvSessionStore`](crate::KvSessionStore).

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

#[cfg(feature = "memory-store")]
mod memory;

#[cfg(feature = "memory-store")]
pub use memory::MemoryKv;

/// Monotonic marker attached to a live entry.
pub type Versionstamp = u64;

/// Result of a lookup. `versionstamp` is `None` when there is no live entry for the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvEntry {
    pub value: Option<Value>,
    pub versionstamp: Option<Versionstamp>,
}

impl KvEntry {
    pub fn exists(&self) -> bool {
        self.versionstamp.is_some()
    }
}

#[async_trait]
pub trait KvEngine: Debug + Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<KvEntry>;

    /// Writes `value`, replacing any existing entry. With a `ttl` the entry stops being
    /// visible once that much time has passed.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<Versionstamp>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Writes `value` only when `key` has no live entry, returning `None` otherwise.
    ///
    /// The provided implementation checks then writes, leaving a window in which a
    /// concurrent writer can slip in. Engines that can create atomically should override it.
    async fn insert_if_absent(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<Option<Versionstamp>> {
        if self.get(key).await?.exists() {
            return Ok(None);
        }

        self.set(key, value, ttl).await.map(Some)
    }
}
