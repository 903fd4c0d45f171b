//! Context management commands.

use std::path::Path;

use anyhow::Result;

use nms_core::LocationCreateRoute;

use crate::config::{ClientConfig, Context};

/// Register a new context. The first one becomes current.
pub fn create(
    name: &str,
    server: &str,
    token_cookie: Option<&str>,
    location_route: Option<LocationCreateRoute>,
    client_config_path: &Path,
) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    config.upsert_context(Context {
        name: name.to_string(),
        server: server.trim_end_matches('/').to_string(),
        cookies: String::new(),
        token_cookie: token_cookie.unwrap_or_default().to_string(),
        location_create_route: location_route,
    });
    if config.current_context.is_empty() {
        config.current_context = name.to_string();
    }
    config.save(client_config_path)?;

    println!("Context \"{}\" created.", name);
    println!("  Server: {}", server);
    Ok(())
}

/// List all contexts.
pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: nms context create <name> --server <url>");
        return Ok(());
    }

    println!("{:2} {:16} {:44} {:10}", "", "NAME", "SERVER", "AUTH");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        let server = if ctx.server.is_empty() { "-" } else { &ctx.server };
        let auth = if ctx.cookies.is_empty() { "-" } else { "cookie" };
        println!("{:2} {:16} {:44} {:10}", marker, ctx.name, server, auth);
    }

    Ok(())
}

/// Switch current context.
pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!("Context \"{}\" not found. Run `nms context list` to see available contexts.", name);
    }

    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

/// Set properties on a context.
pub fn set(
    name: &str,
    server: Option<&str>,
    token_cookie: Option<&str>,
    location_route: Option<LocationCreateRoute>,
    client_config_path: &Path,
) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let ctx = config
        .get_mut(name)
        .ok_or_else(|| anyhow::anyhow!("Context \"{}\" not found.", name))?;

    if let Some(s) = server {
        ctx.server = s.trim_end_matches('/').to_string();
    }
    if let Some(c) = token_cookie {
        ctx.token_cookie = c.to_string();
    }
    if location_route.is_some() {
        ctx.location_create_route = location_route;
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" updated.", name);
    Ok(())
}

/// Delete a context.
pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.remove_context(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}
