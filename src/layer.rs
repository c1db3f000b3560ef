use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{HeaderMap, HeaderValue, Request, Response, header};
use tower_layer::Layer;
use tower_service::Service;

use crate::{config::CookieAttributes, session::Session, storage::SessionStorage};

/// Loads a [`Session`] into request extensions and writes it back through a
/// [`SessionStorage`] once the inner service has responded.
#[derive(Debug)]
pub struct SessionManagerLayer<T: SessionStorage> {
    storage: Arc<T>,
    attributes: CookieAttributes,
}

impl<T: SessionStorage> Clone for SessionManagerLayer<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<T: SessionStorage> SessionManagerLayer<T> {
    pub fn new(storage: T) -> Self {
        Self {
            storage: Arc::new(storage),
            attributes: CookieAttributes::default(),
        }
    }

    /// Attribute overrides applied to every `Set-Cookie` this layer emits.
    #[must_use]
    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

#[derive(Debug)]
pub struct SessionManager<S, T: SessionStorage> {
    inner: S,
    storage: Arc<T>,
    attributes: CookieAttributes,
}

impl<S: Clone, T: SessionStorage> Clone for SessionManager<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            storage: self.storage.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<S, T: SessionStorage> Layer<S> for SessionManagerLayer<T> {
    type Service = SessionManager<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionManager {
            inner,
            storage: self.storage.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// All `Cookie` request headers joined into one, as HTTP/2 clients may split them.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    (!values.is_empty()).then(|| values.join("; "))
}

fn internal_error<B: Default>() -> Response<B> {
    let mut res = Response::default();
    *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
    res
}

impl<ReqBody, ResBody, S, T> Service<Request<ReqBody>> for SessionManager<S, T>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
    T: SessionStorage,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let storage = self.storage.clone();
        let attributes = self.attributes.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let header = cookie_header(req.headers());

            let mut load_failed = false;
            let session = match storage.get_session(header.as_deref()).await {
                Ok(session) => session,
                Err(err) => {
                    tracing::warn!(err = %err, "session load failed, starting a new session");
                    load_failed = true;
                    Session::new()
                }
            };
            // A cookie that failed to load is expired even if the handler never touches it.
            let had_session = load_failed || !session.id().is_empty() || !session.is_empty();

            req.extensions_mut().insert(session.clone());

            let mut res = inner.call(req).await?;

            let set_cookie = if session.is_empty() {
                if !had_session {
                    return Ok(res);
                }
                storage.destroy_session(&session, &attributes).await
            } else if session.is_modified() && !res.status().is_server_error() {
                storage.commit_session(&session, &attributes).await
            } else {
                return Ok(res);
            };

            let set_cookie = match set_cookie {
                Ok(set_cookie) => set_cookie,
                Err(err) => {
                    tracing::error!(err = %err, "session save failed");
                    return Ok(internal_error());
                }
            };

            match HeaderValue::try_from(set_cookie) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                    Ok(res)
                }
                Err(err) => {
                    tracing::error!(err = %err, "session cookie is not a valid header value");
                    Ok(internal_error())
                }
            }
        })
    }
}
