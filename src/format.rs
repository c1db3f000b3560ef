//! Helpers for encoding/decoding cookie payloads.
//!
//! A payload is the standard base64 encoding of the value's JSON text. This keeps arbitrary
//! JSON (quotes, separators, non-ASCII) inside the cookie-safe alphabet before signing.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;

use crate::error::{Error, Result};

/// Encode a JSON value into a cookie payload.
pub fn encode_value(value: &Value) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(STANDARD.encode(bytes))
}

/// Decode a cookie payload back into a JSON value.
pub fn decode_value(payload: &str) -> Result<Value> {
    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|err| Error::MalformedPayload(err.to_string()))?;

    Ok(serde_json::from_slice(&bytes)?)
}
