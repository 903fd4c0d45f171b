//! NMS dashboard HTTP client.
//!
//! Authenticated create/edit/delete calls for devices, locations and their
//! types, plus the read endpoints the forms need. Authentication is handled
//! by pluggable [`TokenSource`] implementations; in the dashboard the token
//! lives in a cookie, read through an injected [`CookieJar`].
//!
//! # Usage
//!
//! ```ignore
//! use nms_client::{CookieToken, NmsClient, SharedCookies};
//!
//! let jar = Arc::new(SharedCookies::new("token=eyJhbGciOi..."));
//! let ts = Arc::new(CookieToken::new(jar, "token"));
//! let client = NmsClient::new(&ClientSettings::from_env(), ts)?;
//! client.delete_device(42).await?;
//! ```

mod client;
pub mod cookie;
mod error;
pub mod request;
pub mod token;

#[cfg(test)]
mod client_test;

pub use client::NmsClient;
pub use cookie::{read_cookie, CookieJar, SharedCookies, StaticCookies};
pub use error::ApiError;
pub use request::RequestSpec;
pub use token::{CookieToken, LoginResponse, NoAuth, PasswordLogin, StaticToken, TokenSource};
