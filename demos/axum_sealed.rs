use std::net::SocketAddr;

use axum::{Extension, Router, routing::get};
use time::Duration;
use tower_sessions_sealed::{
    CookieConfig, EncryptedCookie, EncryptionKey, SameSite, Session, SessionManagerLayer,
    StoreSessionStorage,
};

async fn index(Extension(session): Extension<Session>) -> String {
    let n: usize = session
        .get("n")
        .expect("session get succeeds")
        .unwrap_or(0);
    session.set("n", &(n + 1)).expect("session set succeeds");
    format!("n={n}")
}

#[tokio::main]
async fn main() {
    let key = EncryptionKey::derive(b"an example very very secret key.").expect("32-byte key");
    let config = CookieConfig::default()
        // Default: "session"
        .with_name("session")
        // Default: none (unsigned); the first secret signs, all verify
        .with_secret("current-signing-secret")
        .with_secret("previous-signing-secret")
        // Default: true
        .with_http_only(true)
        // Default: SameSite::Strict
        .with_same_site(SameSite::Strict)
        // Default: none (browser-session cookie); also bounds the stored record
        .with_max_age(Duration::hours(1))
        // Default: true (set to false for local HTTP development)
        .with_secure(false)
        // Default: "/"
        .with_path("/")
        // Default: none
        .without_domain();
    let storage = StoreSessionStorage::memory(EncryptedCookie::new(config, key));

    let app = Router::new()
        .route("/", get(index))
        .layer(SessionManagerLayer::new(storage));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(listener, app)
        .await
        .expect("server runs successfully");
}
