//! Session storage strategies.
//!
//! A strategy turns the request's `Cookie` header into a [`Session`] and a modified session
//! back into a `Set-Cookie` header. [`StoreSessionStorage`] keeps only the session ID in the
//! cookie; [`CookieSessionStorage`] keeps the whole session there.

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::{
    config::CookieAttributes,
    cookie::CookieCodec,
    error::{Error, Result},
    session::Session,
    store::{SessionData, SessionDataStore},
};

pub const DEFAULT_MAX_COOKIE_BYTES: usize = 4096;

#[async_trait]
pub trait SessionStorage: Debug + Send + Sync + 'static {
    /// Loads the session referenced by `header`. A missing or unknown session yields a new,
    /// empty one.
    async fn get_session(&self, header: Option<&str>) -> Result<Session>;

    /// Persists `session` and returns the `Set-Cookie` value that refers to it.
    async fn commit_session(&self, session: &Session, overrides: &CookieAttributes)
    -> Result<String>;

    /// Removes `session` and returns a `Set-Cookie` value that expires the cookie.
    async fn destroy_session(&self, session: &Session, overrides: &CookieAttributes)
    -> Result<String>;
}

fn expiring(overrides: &CookieAttributes) -> CookieAttributes {
    overrides.merged(
        &CookieAttributes::default()
            .with_expires(OffsetDateTime::UNIX_EPOCH)
            .with_max_age(Duration::ZERO),
    )
}

/// Cookie carries the session ID, a [`SessionDataStore`] carries the data.
#[derive(Debug)]
pub struct StoreSessionStorage<S, C> {
    store: S,
    cookie: C,
}

impl<S: SessionDataStore, C: CookieCodec> StoreSessionStorage<S, C> {
    pub fn new(store: S, cookie: C) -> Self {
        Self { store, cookie }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn expires(&self, overrides: &CookieAttributes) -> Option<OffsetDateTime> {
        self.cookie.config().attributes().merged(overrides).expiry_date()
    }
}

#[cfg(feature = "memory-store")]
impl<C: CookieCodec> StoreSessionStorage<crate::KvSessionStore<crate::kv::MemoryKv>, C> {
    /// Storage backed by a private in-process store. Sessions do not survive a restart.
    pub fn memory(cookie: C) -> Self {
        Self::new(
            crate::KvSessionStore::new(crate::kv::MemoryKv::new()),
            cookie,
        )
    }
}

#[async_trait]
impl<S: SessionDataStore, C: CookieCodec> SessionStorage for StoreSessionStorage<S, C> {
    async fn get_session(&self, header: Option<&str>) -> Result<Session> {
        let id = match header {
            Some(header) => self.cookie.decode(header)?,
            None => None,
        };

        let Some(Value::String(id)) = id else {
            return Ok(Session::new());
        };

        match self.store.read_data(&id).await? {
            Some(data) => Ok(Session::from_parts(id, data)),
            None => Ok(Session::new()),
        }
    }

    async fn commit_session(
        &self,
        session: &Session,
        overrides: &CookieAttributes,
    ) -> Result<String> {
        let expires = self.expires(overrides);
        let data = session.data();
        let mut id = session.id();

        if id.is_empty() {
            id = self.store.create_data(&data, expires).await?;
            session.set_id(id.clone());
        } else {
            self.store.update_data(&id, &data, expires).await?;
        }
        tracing::debug!(session_id = %id, "session committed");

        self.cookie.encode(&Value::String(id), overrides)
    }

    async fn destroy_session(
        &self,
        session: &Session,
        overrides: &CookieAttributes,
    ) -> Result<String> {
        let id = session.id();
        if !id.is_empty() {
            self.store.delete_data(&id).await?;
        }

        self.cookie
            .encode(&Value::String(String::new()), &expiring(overrides))
    }
}

/// The whole session lives in the cookie.
#[derive(Debug)]
pub struct CookieSessionStorage<C> {
    cookie: C,
    max_cookie_bytes: usize,
}

impl<C: CookieCodec> CookieSessionStorage<C> {
    pub fn new(cookie: C) -> Self {
        Self {
            cookie,
            max_cookie_bytes: DEFAULT_MAX_COOKIE_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_cookie_bytes(mut self, max_cookie_bytes: usize) -> Self {
        self.max_cookie_bytes = max_cookie_bytes;
        self
    }
}

#[async_trait]
impl<C: CookieCodec> SessionStorage for CookieSessionStorage<C> {
    async fn get_session(&self, header: Option<&str>) -> Result<Session> {
        let value = match header {
            Some(header) => self.cookie.decode(header)?,
            None => None,
        };

        match value {
            Some(Value::Object(data)) => Ok(Session::from_parts(String::new(), data)),
            _ => Ok(Session::new()),
        }
    }

    async fn commit_session(
        &self,
        session: &Session,
        overrides: &CookieAttributes,
    ) -> Result<String> {
        let header = self
            .cookie
            .encode(&Value::Object(session.data()), overrides)?;

        if header.len() > self.max_cookie_bytes {
            return Err(Error::CookieTooLarge {
                size: header.len(),
                max: self.max_cookie_bytes,
            });
        }

        Ok(header)
    }

    async fn destroy_session(
        &self,
        _session: &Session,
        overrides: &CookieAttributes,
    ) -> Result<String> {
        self.cookie
            .encode(&Value::Object(SessionData::new()), &expiring(overrides))
    }
}
