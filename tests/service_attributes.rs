// Tests for how `CookieConfig` maps to emitted cookie attributes when the layer commits a
// session.
mod common;

use axum::body::Body;
use http::{Request, header};
use tower::{ServiceBuilder, ServiceExt as _};

use tower_sessions_sealed::{CookieConfig, DEFAULT_COOKIE_NAME, SameSite};

async fn issued_cookie(config: CookieConfig) -> tower_cookies::Cookie<'static> {
    let svc = ServiceBuilder::new()
        .layer(common::make_signed_layer(config))
        .service_fn(common::handler);

    let req = Request::builder()
        .body(Body::empty())
        .expect("request builds successfully");
    let res = svc.oneshot(req).await.expect("service call succeeds");
    common::get_session_cookie(&res)
}

#[tokio::test]
async fn basic_service() {
    // Exercise: first request writes to the session (causing a cookie to be set), then the second
    // request sends that cookie back.
    // Expectation: the second request leaves the session as it was, so no `Set-Cookie` is
    // emitted.
    let layer = common::make_signed_layer(common::signed_config());
    let svc = ServiceBuilder::new()
        .layer(layer)
        .service_fn(common::handler);

    let req = Request::builder()
        .body(Body::empty())
        .expect("request builds successfully");
    let res = svc
        .clone()
        .oneshot(req)
        .await
        .expect("service call succeeds");
    let session_cookie = common::get_session_cookie(&res);

    let req = Request::builder()
        .header(header::COOKIE, common::cookie_header_value(&session_cookie))
        .body(Body::empty())
        .expect("request builds successfully");
    let res = svc.oneshot(req).await.expect("service call succeeds");

    assert!(res.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn bogus_cookie() {
    // Exercise: the client sends the session cookie name with a value that cannot be verified.
    // Expectation: the layer issues a new `Set-Cookie` so the client stops sending the broken one.
    let layer = common::make_signed_layer(common::signed_config());
    let svc = ServiceBuilder::new()
        .layer(layer)
        .service_fn(common::handler);

    let req = Request::builder()
        .header(header::COOKIE, "session=bogus")
        .body(Body::empty())
        .expect("request builds successfully");
    let res = svc.oneshot(req).await.expect("service call succeeds");

    assert!(res.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn no_set_cookie() {
    // Exercise: handler never touches the session.
    // Expectation: no `Set-Cookie`.
    let layer = common::make_signed_layer(common::signed_config());
    let svc = ServiceBuilder::new()
        .layer(layer)
        .service_fn(common::noop_handler);

    let req = Request::builder()
        .body(Body::empty())
        .expect("request builds successfully");
    let res = svc.oneshot(req).await.expect("service call succeeds");

    assert!(res.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn default_name() {
    let session_cookie = issued_cookie(common::signed_config()).await;

    assert_eq!(session_cookie.name(), DEFAULT_COOKIE_NAME);
}

#[tokio::test]
async fn custom_name() {
    let session_cookie = issued_cookie(common::signed_config().with_name("my.sid")).await;

    assert_eq!(session_cookie.name(), "my.sid");
}

#[tokio::test]
async fn http_only() {
    let session_cookie = issued_cookie(common::signed_config()).await;
    assert_eq!(session_cookie.http_only(), Some(true));

    let session_cookie = issued_cookie(common::signed_config().with_http_only(false)).await;
    assert_eq!(session_cookie.http_only(), None);
}

#[tokio::test]
async fn same_site() {
    for same_site in [SameSite::Strict, SameSite::Lax, SameSite::None] {
        let session_cookie =
            issued_cookie(common::signed_config().with_same_site(same_site)).await;

        assert_eq!(session_cookie.same_site(), Some(same_site));
    }
}

#[tokio::test]
async fn secure() {
    let session_cookie = issued_cookie(common::signed_config().with_secure(true)).await;
    assert_eq!(session_cookie.secure(), Some(true));

    let session_cookie = issued_cookie(common::signed_config().with_secure(false)).await;
    assert_eq!(session_cookie.secure(), None);
}

#[tokio::test]
async fn path() {
    let session_cookie = issued_cookie(common::signed_config().with_path("/foo/bar")).await;

    assert_eq!(session_cookie.path(), Some("/foo/bar"));
}

#[tokio::test]
async fn domain() {
    let session_cookie = issued_cookie(common::signed_config().with_domain("example.com")).await;
    assert_eq!(session_cookie.domain(), Some("example.com"));

    let session_cookie = issued_cookie(
        common::signed_config()
            .with_domain("example.com")
            .without_domain(),
    )
    .await;
    assert_eq!(session_cookie.domain(), None);
}
