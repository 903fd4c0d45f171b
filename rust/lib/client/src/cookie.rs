//! Cookie-string access.
//!
//! The browser exposes cookies as one `a=1; b=2` string. Here that string
//! comes from an injected [`CookieJar`] instead of ambient global state,
//! so anything that reads a token can be tested without a browser.

use std::sync::{PoisonError, RwLock};

use cookie::Cookie;

/// Read `name` from a `"; "`-separated cookie string.
///
/// The first segment starting with `name=` wins; its value is
/// percent-decoded. Returns `None` when no segment matches. A present but
/// empty cookie comes back as `Some("")`.
pub fn read_cookie(cookies: &str, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    let segment = cookies.split("; ").find(|c| c.starts_with(&prefix))?;

    match Cookie::parse_encoded(segment) {
        Ok(c) => Some(c.value().to_string()),
        // Not valid percent-encoding / UTF-8: hand back the raw value.
        Err(_) => Some(
            segment[prefix.len()..]
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string(),
        ),
    }
}

/// Source of the current cookie string. Read on every request, never cached.
pub trait CookieJar: Send + Sync + 'static {
    /// The full cookie string, or `None` if there are no cookies at all.
    fn cookie_string(&self) -> Option<String>;
}

/// A fixed cookie string.
pub struct StaticCookies(String);

impl StaticCookies {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self(cookies.into())
    }
}

impl CookieJar for StaticCookies {
    fn cookie_string(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// A cookie string that can be replaced at runtime (login, logout,
/// session expiry). Readers always see the latest value.
#[derive(Default)]
pub struct SharedCookies {
    inner: RwLock<String>,
}

impl SharedCookies {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(cookies.into()),
        }
    }

    pub fn set(&self, cookies: impl Into<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = cookies.into();
    }

    pub fn clear(&self) {
        self.set(String::new());
    }
}

impl CookieJar for SharedCookies {
    fn cookie_string(&self) -> Option<String> {
        let cookies = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if cookies.is_empty() {
            None
        } else {
            Some(cookies.clone())
        }
    }
}
