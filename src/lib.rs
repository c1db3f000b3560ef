//! Encrypted cookies and key-value backed session storage for `tower`.
//!
//! The crate is layered:
//!
//! - [`crypto`] seals strings into AES-GCM [`Envelope`]s with a fresh random nonce per call.
//! - [`signer`] signs and verifies cookie values with HMAC-SHA256.
//! - [`Cookie`] serializes JSON values into `Set-Cookie` headers, signed when secrets are
//!   configured. [`EncryptedCookie`] wraps it so the value is also confidential.
//! - [`KvSessionStore`] keeps session records in a [`KvEngine`](kv::KvEngine), allocating
//!   IDs that never overwrite a live record.
//! - [`StoreSessionStorage`] and [`CookieSessionStorage`] bind a cookie to a place to keep
//!   session data, and [`SessionManagerLayer`] runs one of them around a `tower` service.
//!
//! # Security
//! An unsigned, unencrypted [`Cookie`] offers **no tamper resistance**. Session cookies should
//! be signed (at least one secret) or encrypted.
//!
//! [`EncryptedCookie::parse`] returns `Ok(None)` for a missing or malformed cookie but an
//! error for one that fails authentication, so callers can tell "no session" apart from
//! "forged session".

pub mod cookie;
pub mod crypto;
pub mod encrypted;
pub mod format;
pub mod kv;
pub mod layer;
pub mod signer;
pub mod storage;

mod config;
mod error;
mod session;
mod store;

pub use tower_cookies::cookie::SameSite;

pub use crate::config::{CookieAttributes, CookieConfig, DEFAULT_COOKIE_NAME};
pub use crate::cookie::{Cookie, CookieCodec};
pub use crate::crypto::{EncryptionKey, Envelope};
pub use crate::encrypted::EncryptedCookie;
pub use crate::error::{Error, Result};
pub use crate::layer::SessionManagerLayer;
pub use crate::session::Session;
pub use crate::storage::{CookieSessionStorage, SessionStorage, StoreSessionStorage};
pub use crate::store::{KvSessionStore, MAX_ID_ATTEMPTS, SessionData, SessionDataStore};
