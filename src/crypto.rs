//! AES-GCM sealing of cookie payloads.
//!
//! Every call to [`encrypt`] draws a fresh 96-bit nonce from the OS CSPRNG, so the same
//! plaintext sealed twice under one key yields two different envelopes.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, consts::U12};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce, aes::Aes192};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const NONCE_LEN: usize = 12;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Symmetric key used to seal and open [`Envelope`]s.
///
/// Raw key material of 16, 24 or 32 bytes selects AES-128, AES-192 or AES-256 in GCM mode.
/// Any other length is rejected by [`EncryptionKey::derive`].
#[derive(Clone)]
pub struct EncryptionKey {
    cipher: Cipher,
}

#[derive(Clone)]
enum Cipher {
    Aes128(Box<Aes128Gcm>),
    Aes192(Box<Aes192Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl EncryptionKey {
    pub fn derive(secret: &[u8]) -> Result<Self> {
        let invalid = |_| Error::KeyImport(format!("unsupported key length {}", secret.len()));

        let cipher = match secret.len() {
            16 => Cipher::Aes128(Box::new(
                Aes128Gcm::new_from_slice(secret).map_err(invalid)?,
            )),
            24 => Cipher::Aes192(Box::new(
                Aes192Gcm::new_from_slice(secret).map_err(invalid)?,
            )),
            32 => Cipher::Aes256(Box::new(
                Aes256Gcm::new_from_slice(secret).map_err(invalid)?,
            )),
            len => {
                return Err(Error::KeyImport(format!(
                    "expected 16, 24 or 32 bytes of key material, got {len}"
                )));
            }
        };

        Ok(Self { cipher })
    }

    /// Key size in bits.
    pub fn bits(&self) -> usize {
        match self.cipher {
            Cipher::Aes128(_) => 128,
            Cipher::Aes192(_) => 192,
            Cipher::Aes256(_) => 256,
        }
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Sealed payload: base64 of `ciphertext || tag` and base64 of the nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub result: String,
    pub iv: String,
}

pub fn encrypt(plaintext: &str, key: &EncryptionKey) -> Result<Envelope> {
    let (nonce, sealed) = match &key.cipher {
        Cipher::Aes128(cipher) => {
            let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
            (nonce, cipher.encrypt(&nonce, plaintext.as_bytes()))
        }
        Cipher::Aes192(cipher) => {
            let nonce = Aes192Gcm::generate_nonce(&mut OsRng);
            (nonce, cipher.encrypt(&nonce, plaintext.as_bytes()))
        }
        Cipher::Aes256(cipher) => {
            let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
            (nonce, cipher.encrypt(&nonce, plaintext.as_bytes()))
        }
    };
    let sealed = sealed.map_err(|_| Error::Encryption)?;

    Ok(Envelope {
        result: STANDARD.encode(sealed),
        iv: STANDARD.encode(nonce),
    })
}

pub fn decrypt(envelope: &Envelope, key: &EncryptionKey) -> Result<String> {
    let sealed = STANDARD
        .decode(envelope.result.as_bytes())
        .map_err(|err| Error::MalformedPayload(format!("ciphertext: {err}")))?;
    let iv = STANDARD
        .decode(envelope.iv.as_bytes())
        .map_err(|err| Error::MalformedPayload(format!("iv: {err}")))?;

    if iv.len() != NONCE_LEN {
        return Err(Error::MalformedPayload(format!(
            "iv must be {NONCE_LEN} bytes, got {}",
            iv.len()
        )));
    }
    let nonce = Nonce::from_slice(&iv);

    let plaintext = match &key.cipher {
        Cipher::Aes128(cipher) => cipher.decrypt(nonce, sealed.as_slice()),
        Cipher::Aes192(cipher) => cipher.decrypt(nonce, sealed.as_slice()),
        Cipher::Aes256(cipher) => cipher.decrypt(nonce, sealed.as_slice()),
    }
    .map_err(|_| Error::Authentication)?;

    String::from_utf8(plaintext).map_err(|err| Error::MalformedPayload(err.to_string()))
}
