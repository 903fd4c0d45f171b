//! Login / logout commands.

use std::path::Path;

use anyhow::Result;
use cookie::Cookie;

use nms_client::PasswordLogin;
use nms_core::ClientSettings;

use crate::config::ClientConfig;

/// Login to the current context's server and store the token cookie.
pub async fn login(
    username: &str,
    password: &str,
    base: ClientSettings,
    client_config_path: &Path,
) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    let ctx = config.require_current()?.clone();
    let settings = ctx.settings(base);

    let resp = PasswordLogin::new(&settings.api_source, username, password)
        .login()
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;

    let ctx_mut = config
        .get_mut(&ctx.name)
        .ok_or_else(|| anyhow::anyhow!("Context disappeared"))?;
    ctx_mut.cookies = token_cookie(&settings.token_cookie, &resp.token);
    config.save(client_config_path)?;

    println!("Logged in as {}.", resp.user.username.as_deref().unwrap_or(username));
    if let Some(expiry) = &resp.user.token_expiry {
        println!("Token expires {}.", expiry);
    }
    println!("Token saved to context \"{}\".", ctx.name);
    Ok(())
}

/// Logout: drop the stored cookies from the current context.
pub fn logout(client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let current_name = config.current_context.clone();
    if current_name.is_empty() {
        anyhow::bail!("No current context.");
    }

    let ctx = config
        .get_mut(&current_name)
        .ok_or_else(|| anyhow::anyhow!("Current context not found."))?;

    ctx.cookies = String::new();
    config.save(client_config_path)?;
    println!("Logged out from context \"{}\".", current_name);
    Ok(())
}

/// Cookie string as a browser would send it back.
fn token_cookie(name: &str, token: &str) -> String {
    Cookie::new(name.to_string(), token.to_string()).encoded().to_string()
}
