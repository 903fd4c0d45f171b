use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Deployment-time client settings.
///
/// Resolved once at startup (usually from the environment) and handed to
/// the HTTP client. Nothing here is secret; the credential comes from a
/// separate token source.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Base URL of the upstream REST API, e.g. `http://10.0.0.5:8000/api/v1`.
    pub api_source: String,

    /// Name of the cookie that carries the bearer token.
    pub token_cookie: String,

    /// Endpoint used when creating a location. See [`LocationCreateRoute`].
    pub location_create_route: LocationCreateRoute,

    /// Per-request timeout. `None` leaves reqwest's default (no timeout).
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_source: "http://localhost:8000/api/v1".to_string(),
            token_cookie: "token".to_string(),
            location_create_route: LocationCreateRoute::default(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientSettings {
    /// Resolve settings from process environment variables.
    ///
    /// Supported variables:
    /// - `NMS_API_SOURCE` (also `NEXT_PUBLIC_NMS_API_SOURCE`, `VITE_NMS_HOST`)
    /// - `NMS_TOKEN_COOKIE`
    /// - `NMS_LOCATION_CREATE_ROUTE` (`devices` | `locations`)
    /// - `NMS_TIMEOUT_SECS` (`0` disables the timeout)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    /// Unparsable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = ClientSettings::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(source) = non_empty("NMS_API_SOURCE")
            .or_else(|| non_empty("NEXT_PUBLIC_NMS_API_SOURCE"))
            .or_else(|| non_empty("VITE_NMS_HOST"))
        {
            settings.api_source = source.trim().trim_end_matches('/').to_string();
        }
        if let Some(name) = non_empty("NMS_TOKEN_COOKIE") {
            settings.token_cookie = name.trim().to_string();
        }
        if let Some(route) = non_empty("NMS_LOCATION_CREATE_ROUTE") {
            match route.parse() {
                Ok(route) => settings.location_create_route = route,
                Err(e) => warn!("ignoring NMS_LOCATION_CREATE_ROUTE: {}", e),
            }
        }
        if let Some(secs) = non_empty("NMS_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(0) => settings.request_timeout = None,
                Ok(n) => settings.request_timeout = Some(Duration::from_secs(n)),
                Err(_) => warn!("ignoring NMS_TIMEOUT_SECS: {:?} is not a number", secs),
            }
        }

        settings
    }
}

/// Which endpoint receives location creation.
///
/// The dashboard this client serves posts new locations to `/devices`,
/// which looks like a defect but has not been confirmed by the API owner.
/// `Devices` keeps the observed behaviour and is the default; switch to
/// `Locations` once upstream confirms the intended route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCreateRoute {
    #[default]
    Devices,
    Locations,
}

impl LocationCreateRoute {
    pub fn path(self) -> &'static str {
        match self {
            LocationCreateRoute::Devices => "/devices",
            LocationCreateRoute::Locations => "/locations",
        }
    }
}

impl FromStr for LocationCreateRoute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('/').to_lowercase().as_str() {
            "devices" => Ok(LocationCreateRoute::Devices),
            "locations" => Ok(LocationCreateRoute::Locations),
            other => Err(format!("unknown location route {:?}", other)),
        }
    }
}

impl fmt::Display for LocationCreateRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
