//! Encrypted cookies.
//!
//! An [`EncryptedCookie`] seals the JSON text of a value into an [`Envelope`] and hands the
//! envelope to a plain [`Cookie`] as its value. The outer cookie still signs its payload when
//! secrets are configured, so a forged cookie is usually rejected before decryption is
//! attempted.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    config::{CookieAttributes, CookieConfig},
    cookie::{Cookie, CookieCodec},
    crypto::{self, EncryptionKey, Envelope},
    error::Result,
};

#[derive(Debug, Clone)]
pub struct EncryptedCookie {
    cookie: Cookie,
    key: EncryptionKey,
}

impl EncryptedCookie {
    pub fn new(config: CookieConfig, key: EncryptionKey) -> Self {
        Self {
            cookie: Cookie::new(config),
            key,
        }
    }

    pub fn name(&self) -> &str {
        self.cookie.name()
    }

    pub fn is_signed(&self) -> bool {
        self.cookie.is_signed()
    }

    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        self.serialize_with(value, &CookieAttributes::default())
    }

    pub fn serialize_with<T: Serialize + ?Sized>(
        &self,
        value: &T,
        overrides: &CookieAttributes,
    ) -> Result<String> {
        let plaintext = serde_json::to_string(value)?;
        let envelope = crypto::encrypt(&plaintext, &self.key)?;

        self.cookie
            .serialize_with(&serde_json::to_value(envelope)?, overrides)
    }

    /// Opens the cookie found in `header`.
    ///
    /// A missing cookie, one whose signature does not verify, or one whose payload is not
    /// envelope-shaped yields `Ok(None)`. Once an envelope is found it must open:
    /// undecodable base64 or a bad IV length is
    /// [`Error::MalformedPayload`](crate::Error::MalformedPayload), and a failed tag check is
    /// [`Error::Authentication`](crate::Error::Authentication).
    ///
    /// Decrypted text that is not JSON is returned as a string value.
    pub fn parse(&self, header: &str) -> Result<Option<Value>> {
        let Some(payload) = self.cookie.parse(header) else {
            return Ok(None);
        };
        let Ok(envelope) = serde_json::from_value::<Envelope>(payload) else {
            return Ok(None);
        };

        let plaintext = crypto::decrypt(&envelope, &self.key)?;

        Ok(Some(
            serde_json::from_str(&plaintext).unwrap_or(Value::String(plaintext)),
        ))
    }

    pub fn parse_as<T: DeserializeOwned>(&self, header: &str) -> Result<Option<T>> {
        self.parse(header)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }
}

impl CookieCodec for EncryptedCookie {
    fn config(&self) -> &CookieConfig {
        self.cookie.config()
    }

    fn encode(&self, value: &Value, overrides: &CookieAttributes) -> Result<String> {
        self.serialize_with(value, overrides)
    }

    fn decode(&self, header: &str) -> Result<Option<Value>> {
        self.parse(header)
    }
}
