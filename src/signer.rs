//! HMAC-SHA256 signing of cookie values.
//!
//! A signed token is `value + "." + mac`, where `mac` is the standard base64 encoding of the
//! HMAC with its `=` padding stripped. Tokens are split at the last `.`, so values may
//! contain dots themselves.

use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

fn mac_for(secret: &[u8]) -> Option<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(secret).ok()
}

pub fn sign(value: &str, secret: &[u8]) -> Result<String> {
    let mut mac =
        mac_for(secret).ok_or_else(|| Error::KeyImport("HMAC key rejected".into()))?;
    mac.update(value.as_bytes());
    let tag = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{value}{SEPARATOR}{tag}"))
}

/// Returns the original value when `token` carries a valid MAC for `secret`.
pub fn verify(token: &str, secret: &[u8]) -> Option<String> {
    let (value, tag) = token.rsplit_once(SEPARATOR)?;
    if value.is_empty() || tag.is_empty() {
        return None;
    }

    let tag = STANDARD_NO_PAD.decode(tag.trim_end_matches('=')).ok()?;

    let mut mac = mac_for(secret)?;
    mac.update(value.as_bytes());
    mac.verify_slice(&tag).ok()?;

    Some(value.to_owned())
}
