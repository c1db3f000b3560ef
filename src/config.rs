use std::borrow::Cow;

use time::{Duration, OffsetDateTime};
use tower_cookies::Cookie;

use crate::SameSite;

pub const DEFAULT_COOKIE_NAME: &str = "session";

/// Attributes attached to a `Set-Cookie` header.
///
/// Every field is optional so the same type doubles as a per-call override set: see
/// [`CookieAttributes::merged`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieAttributes {
    pub(crate) domain: Option<Cow<'static, str>>,
    pub(crate) path: Option<Cow<'static, str>>,
    pub(crate) expires: Option<OffsetDateTime>,
    pub(crate) max_age: Option<Duration>,
    pub(crate) http_only: Option<bool>,
    pub(crate) same_site: Option<SameSite>,
    pub(crate) secure: Option<bool>,
}

impl CookieAttributes {
    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.expires = Some(expires);
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Attributes in `overrides` win over the ones in `self`.
    #[must_use]
    pub fn merged(&self, overrides: &CookieAttributes) -> Self {
        Self {
            domain: overrides.domain.clone().or_else(|| self.domain.clone()),
            path: overrides.path.clone().or_else(|| self.path.clone()),
            expires: overrides.expires.or(self.expires),
            max_age: overrides.max_age.or(self.max_age),
            http_only: overrides.http_only.or(self.http_only),
            same_site: overrides.same_site.or(self.same_site),
            secure: overrides.secure.or(self.secure),
        }
    }

    /// Absolute expiry implied by these attributes. `Max-Age` takes precedence over
    /// `Expires`, the way browsers resolve the two.
    pub fn expiry_date(&self) -> Option<OffsetDateTime> {
        match (self.max_age, self.expires) {
            (Some(max_age), _) => Some(OffsetDateTime::now_utc() + max_age),
            (None, expires) => expires,
        }
    }

    pub(crate) fn build_cookie(&self, name: Cow<'static, str>, value: String) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((name, value));

        if let Some(http_only) = self.http_only {
            cookie_builder = cookie_builder.http_only(http_only);
        }
        if let Some(same_site) = self.same_site {
            cookie_builder = cookie_builder.same_site(same_site);
        }
        if let Some(secure) = self.secure {
            cookie_builder = cookie_builder.secure(secure);
        }
        if let Some(path) = self.path.clone() {
            cookie_builder = cookie_builder.path(path);
        }
        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }
        if let Some(max_age) = self.max_age {
            cookie_builder = cookie_builder.max_age(std::cmp::max(max_age, Duration::ZERO));
        }
        if let Some(expires) = self.expires {
            cookie_builder = cookie_builder.expires(expires);
        }

        cookie_builder.build()
    }
}

/// Name, signing secrets and default attributes of a cookie.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub(crate) name: Cow<'static, str>,
    pub(crate) secrets: Vec<Vec<u8>>,
    pub(crate) attributes: CookieAttributes,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.into(),
            secrets: Vec::new(),
            attributes: CookieAttributes {
                path: Some("/".into()),
                http_only: Some(true),
                same_site: Some(SameSite::Strict),
                secure: Some(true),
                ..CookieAttributes::default()
            },
        }
    }
}

impl CookieConfig {
    pub fn new<N: Into<Cow<'static, str>>>(name: N) -> Self {
        Self::default().with_name(name)
    }

    #[must_use]
    pub fn with_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a signing secret. The first secret signs new cookies; all of them are tried when
    /// verifying, so older secrets can be kept around while rotating.
    #[must_use]
    pub fn with_secret<S: AsRef<[u8]>>(mut self, secret: S) -> Self {
        self.secrets.push(secret.as_ref().to_vec());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = self.attributes.merged(&attributes);
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.attributes.http_only = Some(http_only);
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.attributes.same_site = Some(same_site);
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.attributes.secure = Some(secure);
        self
    }

    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.attributes.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.attributes.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.attributes.domain = None;
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.attributes.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.attributes.expires = Some(expires);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &CookieAttributes {
        &self.attributes
    }
}
