//! Request construction, kept separate from transmission so the header
//! and body rules can be checked without a server.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

use nms_core::ValidationError;

use crate::ApiError;

/// A fully built, not yet sent, API request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    /// Build a JSON request.
    ///
    /// - `Content-Type: application/json` is always set.
    /// - `Authorization: Bearer <token>` is set only for a non-empty token;
    ///   otherwise the header is left out entirely.
    /// - `body` is serialized for methods that carry one and ignored for
    ///   GET, HEAD and DELETE.
    pub fn build(
        method: Method,
        url: impl Into<String>,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ValidationError::new("token", "credential token is not a valid header value")
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let body = match body {
            Some(value) if carries_body(&method) => Some(
                serde_json::to_vec(value)
                    .map_err(|e| ValidationError::new("body", format!("unserializable body: {}", e)))?,
            ),
            _ => None,
        };

        Ok(Self {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    pub fn is_authorized(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }

    /// Hand the request to reqwest. Nothing is sent until the returned
    /// builder's `send()` is awaited.
    pub fn into_request(self, http: &reqwest::Client) -> reqwest::RequestBuilder {
        let builder = http.request(self.method, self.url).headers(self.headers);
        match self.body {
            Some(body) => builder.body(body),
            None => builder,
        }
    }
}

fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}
