//! Credential providers.
//!
//! The client asks its [`TokenSource`] for a bearer token before every
//! request. `Ok(None)` means "send no Authorization header".

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::cookie::{read_cookie, CookieJar};
use crate::ApiError;

/// Pluggable token provider. Called before every API request.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;
}

/// No authentication; requests go out anonymous.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// Static bearer token (already obtained externally).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

/// Token stored in a named cookie, re-read from the jar on every call.
///
/// An empty cookie value counts as absent.
pub struct CookieToken {
    jar: Arc<dyn CookieJar>,
    name: String,
}

impl CookieToken {
    pub fn new(jar: Arc<dyn CookieJar>, name: impl Into<String>) -> Self {
        Self {
            jar,
            name: name.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for CookieToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        let token = self
            .jar
            .cookie_string()
            .and_then(|cookies| read_cookie(&cookies, &self.name))
            .filter(|t| !t.is_empty());
        if token.is_none() {
            debug!(cookie = %self.name, "no token cookie, sending anonymous request");
        }
        Ok(token)
    }
}

/// Password-based login against `POST /auth/login`. Lazily authenticates
/// on first use, caches the token, and logs in again once it expires.
pub struct PasswordLogin {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    cached: tokio::sync::RwLock<Option<CachedToken>>,
}

struct CachedToken {
    token: String,
    /// Absolute expiry timestamp (seconds since epoch).
    expires_at: i64,
}

/// Successful login body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// RFC 3339 expiry of `token`.
    #[serde(default)]
    pub token_expiry: Option<String>,
}

impl LoginResponse {
    /// Expiry as seconds since epoch, 30 s early to stay clear of the edge.
    /// Unknown or unparsable expiry means "already expired", so the token
    /// is used once and never cached.
    fn expires_at(&self) -> i64 {
        self.user
            .token_expiry
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.timestamp() - 30)
            .unwrap_or(i64::MIN)
    }
}

impl PasswordLogin {
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            cached: tokio::sync::RwLock::new(None),
        }
    }

    /// Perform the login call without touching the cache.
    pub async fn login(&self) -> Result<LoginResponse, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        let resp = self.http.post(&url)
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::RemoteRejection {
                status: status.as_u16(),
                message: crate::client::rejection_message(status, &body),
            });
        }

        resp.json::<LoginResponse>().await
            .map_err(|e| ApiError::MalformedResponse(format!("login response: {}", e)))
    }
}

#[async_trait::async_trait]
impl TokenSource for PasswordLogin {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        {
            let guard = self.cached.read().await;
            if let Some(ref cached) = *guard {
                if chrono::Utc::now().timestamp() < cached.expires_at {
                    return Ok(Some(cached.token.clone()));
                }
            }
        }

        let mut guard = self.cached.write().await;
        // Another caller may have logged in while we waited for the lock.
        if let Some(ref cached) = *guard {
            if chrono::Utc::now().timestamp() < cached.expires_at {
                return Ok(Some(cached.token.clone()));
            }
        }

        let fresh = self.login().await?;
        let token = fresh.token.clone();
        *guard = Some(CachedToken {
            expires_at: fresh.expires_at(),
            token: fresh.token,
        });
        Ok(Some(token))
    }
}
