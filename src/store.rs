use std::{fmt, sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tower_sessions_core::{
    SessionStore,
    session::{Id, Record},
    session_store,
};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    kv::KvEngine,
};

/// Upper bound on ID generation attempts before [`Error::ExhaustedRetries`].
///
/// Random IDs essentially never collide, so hitting this means the generator or the
/// engine's existence check is broken.
pub const MAX_ID_ATTEMPTS: usize = 1024;

pub type SessionData = serde_json::Map<String, Value>;

type IdGenerator = dyn Fn(&SessionData) -> String + Send + Sync;

/// Persistence contract a session storage strategy binds to.
#[async_trait]
pub trait SessionDataStore: fmt::Debug + Send + Sync + 'static {
    /// Stores `data` under a fresh ID and returns that ID.
    async fn create_data(&self, data: &SessionData, expires: Option<OffsetDateTime>)
    -> Result<String>;

    async fn read_data(&self, id: &str) -> Result<Option<SessionData>>;

    /// Overwrites the record at `id`, creating it when it does not exist.
    async fn update_data(
        &self,
        id: &str,
        data: &SessionData,
        expires: Option<OffsetDateTime>,
    ) -> Result<()>;

    async fn delete_data(&self, id: &str) -> Result<()>;
}

/// Session records kept in a [`KvEngine`], one entry per session ID.
pub struct KvSessionStore<K: KvEngine> {
    kv: Arc<K>,
    id_generator: Option<Arc<IdGenerator>>,
}

impl<K: KvEngine> Clone for KvSessionStore<K> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            id_generator: self.id_generator.clone(),
        }
    }
}

impl<K: KvEngine> fmt::Debug for KvSessionStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvSessionStore")
            .field("kv", &self.kv)
            .field("custom_id_generator", &self.id_generator.is_some())
            .finish()
    }
}

impl<K: KvEngine> KvSessionStore<K> {
    pub fn new(kv: K) -> Self {
        Self::from_shared(Arc::new(kv))
    }

    /// Builds a store over an engine handle shared with other owners, e.g. one returned by
    /// [`MemoryKv::open`](crate::kv::MemoryKv::open).
    pub fn from_shared(kv: Arc<K>) -> Self {
        Self {
            kv,
            id_generator: None,
        }
    }

    /// Replaces the default random UUID generator. Collisions are still detected and the
    /// generator is called again.
    #[must_use]
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&SessionData) -> String + Send + Sync + 'static,
    {
        self.id_generator = Some(Arc::new(generator));
        self
    }

    pub fn engine(&self) -> &Arc<K> {
        &self.kv
    }

    fn generate_id(&self, data: &SessionData) -> String {
        match &self.id_generator {
            Some(generator) => generator(data),
            None => Uuid::new_v4().to_string(),
        }
    }
}

/// Time left until `expires`, clamped at zero so past dates expire immediately.
fn ttl_until(expires: Option<OffsetDateTime>) -> Option<StdDuration> {
    expires.map(|expires| {
        let remaining = expires - OffsetDateTime::now_utc();
        StdDuration::try_from(remaining).unwrap_or(StdDuration::ZERO)
    })
}

#[async_trait]
impl<K: KvEngine> SessionDataStore for KvSessionStore<K> {
    async fn create_data(
        &self,
        data: &SessionData,
        expires: Option<OffsetDateTime>,
    ) -> Result<String> {
        let ttl = ttl_until(expires);
        let value = Value::Object(data.clone());

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.generate_id(data);
            if self
                .kv
                .insert_if_absent(&id, value.clone(), ttl)
                .await?
                .is_some()
            {
                return Ok(id);
            }
            tracing::debug!("session id collision, generating another");
        }

        Err(Error::ExhaustedRetries(MAX_ID_ATTEMPTS))
    }

    async fn read_data(&self, id: &str) -> Result<Option<SessionData>> {
        let entry = self.kv.get(id).await?;
        if !entry.exists() {
            return Ok(None);
        }

        match entry.value {
            Some(Value::Object(data)) => Ok(Some(data)),
            Some(other) => Err(Error::MalformedPayload(format!(
                "session {id} holds a non-object value: {other}"
            ))),
            None => Ok(None),
        }
    }

    async fn update_data(
        &self,
        id: &str,
        data: &SessionData,
        expires: Option<OffsetDateTime>,
    ) -> Result<()> {
        self.kv
            .set(id, Value::Object(data.clone()), ttl_until(expires))
            .await?;
        Ok(())
    }

    async fn delete_data(&self, id: &str) -> Result<()> {
        self.kv.delete(id).await
    }
}

/// Records are kept as JSON text. `Id` holds an `i128`, which a `serde_json::Value` number
/// cannot represent.
fn encode_record(record: &Record) -> Result<Value> {
    Ok(Value::String(serde_json::to_string(record)?))
}

#[async_trait]
impl<K: KvEngine> SessionStore for KvSessionStore<K> {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let ttl = ttl_until(Some(record.expiry_date));

        for _ in 0..MAX_ID_ATTEMPTS {
            let value = encode_record(record)?;
            if self
                .kv
                .insert_if_absent(&record.id.to_string(), value, ttl)
                .await?
                .is_some()
            {
                return Ok(());
            }
            tracing::debug!("session id collision, generating another");
            record.id = Id::default();
        }

        Err(Error::ExhaustedRetries(MAX_ID_ATTEMPTS).into())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let value = encode_record(record)?;
        self.kv
            .set(
                &record.id.to_string(),
                value,
                ttl_until(Some(record.expiry_date)),
            )
            .await?;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let entry = self.kv.get(&session_id.to_string()).await?;
        let Some(value) = entry.value.filter(|_| entry.versionstamp.is_some()) else {
            return Ok(None);
        };

        let Value::String(text) = value else {
            return Err(session_store::Error::Decode(format!(
                "session {session_id} is not an encoded record"
            )));
        };
        let record: Record = serde_json::from_str(&text)
            .map_err(|err| session_store::Error::Decode(err.to_string()))?;

        Ok(Some(record).filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.kv.delete(&session_id.to_string()).await?;
        Ok(())
    }
}
