use thiserror::Error;
use tower_sessions_core::session_store;

#[derive(Debug, Error)]
pub enum Error {
    /// Key material the cipher cannot be built from.
    #[error("invalid key material: {0}")]
    KeyImport(String),

    /// The authentication tag did not verify: tampered ciphertext, wrong key or wrong nonce.
    #[error("authentication failed")]
    Authentication,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("encryption failed")]
    Encryption,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("no unique session id after {0} attempts")]
    ExhaustedRetries(usize),

    #[error("cookie length {size} exceeds the maximum of {max} bytes")]
    CookieTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for session_store::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Json(err) => session_store::Error::Encode(err.to_string()),
            err @ (Error::Authentication | Error::MalformedPayload(_)) => {
                session_store::Error::Decode(err.to_string())
            }
            err => session_store::Error::Backend(err.to_string()),
        }
    }
}
