#![allow(dead_code)]

// Shared helpers for integration tests.
//
// These helpers use `tower_cookies::Cookie` parsing/encoding to match what the middleware emits
// in `Set-Cookie` and what browsers send back in `Cookie`.
use std::convert::Infallible;

use axum::body::Body;
use http::{HeaderMap, Request, Response, header};
use http_body_util::BodyExt as _;
use tower_cookies::Cookie;
use tower_sessions_sealed::{
    Cookie as SessionCookie, CookieConfig, EncryptedCookie, EncryptionKey, KvSessionStore,
    Session, SessionManagerLayer, StoreSessionStorage, kv::MemoryKv,
};

pub type SignedStorage = StoreSessionStorage<KvSessionStore<MemoryKv>, SessionCookie>;
pub type EncryptedStorage = StoreSessionStorage<KvSessionStore<MemoryKv>, EncryptedCookie>;

pub const SECRET: &str = "integration-test-secret";

pub async fn body_string(body: Body) -> String {
    // Collect an Axum body into a UTF-8 string for assertions.
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn session_from(req: &Request<Body>) -> Session {
    req.extensions()
        .get::<Session>()
        .cloned()
        .expect("request includes Session extension")
}

pub async fn handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Basic handler used by many tests: write a single key into the session.
    session_from(&req)
        .set("foo", &42)
        .expect("session set succeeds");

    Ok(Response::new(Body::empty()))
}

pub async fn clear_handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Empties the session, which should destroy it.
    session_from(&req).clear();

    Ok(Response::new(Body::empty()))
}

pub async fn noop_handler(_: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Handler that does not access the session at all.
    Ok(Response::new(Body::empty()))
}

pub fn signed_config() -> CookieConfig {
    CookieConfig::default().with_secret(SECRET)
}

pub fn make_signed_layer(config: CookieConfig) -> SessionManagerLayer<SignedStorage> {
    SessionManagerLayer::new(StoreSessionStorage::memory(SessionCookie::new(config)))
}

pub fn encryption_key() -> EncryptionKey {
    EncryptionKey::derive(b"0123456789abcdef0123456789abcdef").expect("32-byte key imports")
}

pub fn make_encrypted_layer(config: CookieConfig) -> SessionManagerLayer<EncryptedStorage> {
    SessionManagerLayer::new(StoreSessionStorage::memory(EncryptedCookie::new(
        config,
        encryption_key(),
    )))
}

pub fn get_session_cookie(res: &Response<Body>) -> Cookie<'static> {
    // Convenience: parse the session cookie from a response.
    get_session_cookie_from_headers(res.headers())
}

pub fn get_session_cookie_from_headers(headers: &HeaderMap) -> Cookie<'static> {
    // Parse the `Set-Cookie` header into a `Cookie` structure.
    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("response includes set-cookie header");
    let set_cookie = set_cookie
        .to_str()
        .expect("set-cookie header is valid utf-8");
    Cookie::parse_encoded(set_cookie)
        .expect("set-cookie parses successfully")
        .into_owned()
}

pub fn cookie_header_value(cookie: &Cookie<'_>) -> String {
    // Encode a cookie for use in a `Cookie` request header.
    cookie.encoded().stripped().to_string()
}
