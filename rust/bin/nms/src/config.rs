//! Client-side context management.
//!
//! Reads/writes `~/.nms/config.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use nms_client::{CookieToken, NmsClient, StaticCookies};
use nms_core::{ClientSettings, LocationCreateRoute};

/// A single context: one NMS API plus the browser-style cookie string
/// that carries its auth token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Context name (e.g. "lab").
    pub name: String,

    /// API base URL (e.g. "http://nms.local:8000/api/v1").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Raw cookie string, `name=value; name=value` (set by `nms login`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cookies: String,

    /// Cookie holding the token. Empty means the environment default.
    #[serde(rename = "token-cookie", default, skip_serializing_if = "String::is_empty")]
    pub token_cookie: String,

    /// Endpoint used for location creation.
    #[serde(rename = "location-route", default, skip_serializing_if = "Option::is_none")]
    pub location_create_route: Option<LocationCreateRoute>,
}

impl Context {
    /// Environment settings with this context's overrides applied.
    pub fn settings(&self, base: ClientSettings) -> ClientSettings {
        let mut settings = base;
        if !self.server.is_empty() {
            settings.api_source = self.server.trim_end_matches('/').to_string();
        }
        if !self.token_cookie.is_empty() {
            settings.token_cookie = self.token_cookie.clone();
        }
        if let Some(route) = self.location_create_route {
            settings.location_create_route = route;
        }
        settings
    }

    /// Client authenticated from this context's cookie string.
    pub fn client(&self, base: ClientSettings) -> anyhow::Result<NmsClient> {
        let settings = self.settings(base);
        let jar = Arc::new(StaticCookies::new(self.cookies.clone()));
        let tokens = Arc::new(CookieToken::new(jar, settings.token_cookie.clone()));
        NmsClient::new(&settings, tokens).context("failed to build HTTP client")
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    /// List of configured contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.nms/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: ClientConfig = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the currently active context, if any.
    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    /// Current context or an error telling the user how to pick one.
    pub fn require_current(&self) -> anyhow::Result<&Context> {
        self.current()
            .ok_or_else(|| anyhow::anyhow!("No current context. Run `nms use context <name>`."))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }

    /// Remove a context by name. Returns true if it was found.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let len = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        self.contexts.len() < len
    }
}

/// Return the NMS config directory (~/.nms).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".nms")
}
