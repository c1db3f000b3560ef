//! Signed cookies.
//!
//! Attribute formatting and header parsing are delegated to the `cookie` crate; this module
//! only decides what goes into the value: a [`format`](crate::format) payload, signed with
//! the first configured secret when there is one.

use std::borrow::Cow;

use serde_json::Value;
use time::OffsetDateTime;
use tower_cookies::Cookie as RawCookie;

use crate::{
    config::{CookieAttributes, CookieConfig},
    error::Result,
    format, signer,
};

#[derive(Debug, Clone)]
pub struct Cookie {
    config: CookieConfig,
}

impl Cookie {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    pub fn is_signed(&self) -> bool {
        !self.config.secrets.is_empty()
    }

    /// Configured `Expires`, or the instant implied by `Max-Age` when that is set.
    pub fn expires(&self) -> Option<OffsetDateTime> {
        self.config.attributes.expiry_date()
    }

    pub fn serialize(&self, value: &Value) -> Result<String> {
        self.serialize_with(value, &CookieAttributes::default())
    }

    /// Serializes `value` into a `Set-Cookie` header value, applying `overrides` on top of
    /// the configured attributes.
    pub fn serialize_with(&self, value: &Value, overrides: &CookieAttributes) -> Result<String> {
        let mut payload = format::encode_value(value)?;
        if let Some(secret) = self.config.secrets.first() {
            payload = signer::sign(&payload, secret)?;
        }

        let cookie = self
            .config
            .attributes
            .merged(overrides)
            .build_cookie(self.config.name.clone(), payload);

        Ok(cookie.encoded().to_string())
    }

    /// Extracts this cookie's value from a `Cookie` or `Set-Cookie` header.
    ///
    /// Returns `None` when the cookie is missing, its signature does not verify under any
    /// configured secret, or its payload does not decode.
    pub fn parse(&self, header: &str) -> Option<Value> {
        let raw = find_cookie(header, &self.config.name)?;
        let payload = self.unsign(raw.value())?;

        match format::decode_value(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(err = %err, cookie = %self.config.name, "cookie payload decode failed");
                None
            }
        }
    }

    fn unsign<'a>(&self, value: &'a str) -> Option<Cow<'a, str>> {
        if !self.is_signed() {
            return Some(Cow::Borrowed(value));
        }

        self.config
            .secrets
            .iter()
            .find_map(|secret| signer::verify(value, secret))
            .map(Cow::Owned)
    }
}

/// A cookie that can carry a session: plain signed [`Cookie`] or
/// [`EncryptedCookie`](crate::EncryptedCookie).
pub trait CookieCodec: std::fmt::Debug + Send + Sync + 'static {
    fn config(&self) -> &CookieConfig;

    fn encode(&self, value: &Value, overrides: &CookieAttributes) -> Result<String>;

    fn decode(&self, header: &str) -> Result<Option<Value>>;
}

impl CookieCodec for Cookie {
    fn config(&self) -> &CookieConfig {
        &self.config
    }

    fn encode(&self, value: &Value, overrides: &CookieAttributes) -> Result<String> {
        self.serialize_with(value, overrides)
    }

    fn decode(&self, header: &str) -> Result<Option<Value>> {
        Ok(self.parse(header))
    }
}

/// Finds the first cookie called `name` in a header. Attribute pairs of a `Set-Cookie`
/// string and flags without a value are skipped.
pub(crate) fn find_cookie(header: &str, name: &str) -> Option<RawCookie<'static>> {
    RawCookie::split_parse_encoded(header.to_owned())
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == name)
        .map(RawCookie::into_owned)
}
