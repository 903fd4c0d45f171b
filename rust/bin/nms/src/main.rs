//! `nms`: command-line client for the NMS dashboard API.
//!
//! Manages contexts and login, and runs device/location mutations through
//! the same form status flow the dashboard uses.

mod commands;
mod config;

use clap::{Parser, Subcommand};

use nms_core::{ClientSettings, LocationCreateRoute};

/// NMS CLI tool.
#[derive(Parser, Debug)]
#[command(name = "nms", about = "NMS dashboard API client")]
struct Cli {
    /// Path to client config file (default: ~/.nms/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format for results: table or json. Table lists object fields
    /// as rows; nested values and lists print as JSON.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts (API endpoint + stored cookies).
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    #[command(name = "use")]
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// Login to the current context's server.
    Login {
        /// Username.
        #[arg(long)]
        user: Option<String>,
        /// Password (not recommended; use the interactive prompt).
        #[arg(long)]
        password: Option<String>,
    },

    /// Logout: clear stored cookies from the current context.
    Logout,

    /// Device operations.
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },

    /// Location operations.
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },

    /// List workers.
    Workers,

    /// Show device statistics.
    Stats,

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create a new context.
    Create {
        name: String,
        /// API base URL, e.g. http://nms.local:8000/api/v1.
        #[arg(long)]
        server: String,
        /// Cookie carrying the auth token (default: token).
        #[arg(long)]
        token_cookie: Option<String>,
        /// Endpoint for location creation: devices or locations.
        #[arg(long)]
        location_route: Option<LocationCreateRoute>,
    },
    /// List all contexts.
    List,
    /// Set properties on a context.
    Set {
        name: String,
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        token_cookie: Option<String>,
        #[arg(long)]
        location_route: Option<LocationCreateRoute>,
    },
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

#[derive(Subcommand, Debug)]
enum DeviceAction {
    /// Create a device from JSON.
    Create {
        #[arg(long = "json")]
        json_body: Option<String>,
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    /// Create a device type.
    CreateType { name: String },
    /// Change one field of a device.
    Edit { id: u64, field: String, value: String },
    /// Delete a device.
    Delete {
        id: u64,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
    /// Show one device.
    Get { id: u64 },
    /// List device types.
    Types,
}

#[derive(Subcommand, Debug)]
enum LocationAction {
    /// Create a location from JSON.
    Create {
        #[arg(long = "json")]
        json_body: Option<String>,
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    /// Create a location type.
    CreateType { name: String },
    /// Change one field of a location.
    Edit { id: u64, field: String, data: String },
    /// Delete a location.
    Delete {
        id: u64,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
    /// List location types.
    Types,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let json_output = cli.output == "json";

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Create {
                name,
                server,
                token_cookie,
                location_route,
            } => {
                commands::context::create(
                    &name,
                    &server,
                    token_cookie.as_deref(),
                    location_route,
                    &config_path,
                )?;
            }
            ContextAction::List => {
                commands::context::list(&config_path)?;
            }
            ContextAction::Set {
                name,
                server,
                token_cookie,
                location_route,
            } => {
                commands::context::set(
                    &name,
                    server.as_deref(),
                    token_cookie.as_deref(),
                    location_route,
                    &config_path,
                )?;
            }
            ContextAction::Delete { name } => {
                commands::context::delete(&name, &config_path)?;
            }
        },

        Commands::Use { what } => match what {
            UseWhat::Context { name } => {
                commands::context::use_context(&name, &config_path)?;
            }
        },

        Commands::Login { user, password } => {
            let username = match user {
                Some(u) => u,
                None => {
                    eprint!("Username: ");
                    let mut s = String::new();
                    std::io::stdin().read_line(&mut s)?;
                    s.trim().to_string()
                }
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            if password.is_empty() {
                anyhow::bail!("Password cannot be empty.");
            }
            commands::login::login(&username, &password, ClientSettings::from_env(), &config_path)
                .await?;
        }

        Commands::Logout => {
            commands::login::logout(&config_path)?;
        }

        Commands::Device { action } => {
            let client = api_client(&config_path)?;
            match action {
                DeviceAction::Create { json_body, file } => {
                    let body = commands::read_body(json_body, file)?;
                    commands::device::create(&client, json_output, &body).await?;
                }
                DeviceAction::CreateType { name } => {
                    commands::device::create_type(&client, json_output, &name).await?;
                }
                DeviceAction::Edit { id, field, value } => {
                    commands::device::edit(&client, json_output, id, &field, &value).await?;
                }
                DeviceAction::Delete { id, yes } => {
                    commands::device::delete(&client, id, yes).await?;
                }
                DeviceAction::Get { id } => {
                    commands::device::get(&client, json_output, id).await?;
                }
                DeviceAction::Types => {
                    commands::device::types(&client, json_output).await?;
                }
            }
        }

        Commands::Location { action } => {
            let client = api_client(&config_path)?;
            match action {
                LocationAction::Create { json_body, file } => {
                    let body = commands::read_body(json_body, file)?;
                    commands::location::create(&client, json_output, &body).await?;
                }
                LocationAction::CreateType { name } => {
                    commands::location::create_type(&client, json_output, &name).await?;
                }
                LocationAction::Edit { id, field, data } => {
                    commands::location::edit(&client, json_output, id, &field, &data).await?;
                }
                LocationAction::Delete { id, yes } => {
                    commands::location::delete(&client, id, yes).await?;
                }
                LocationAction::Types => {
                    commands::location::types(&client, json_output).await?;
                }
            }
        }

        Commands::Workers => {
            let client = api_client(&config_path)?;
            commands::report::workers(&client, json_output).await?;
        }

        Commands::Stats => {
            let client = api_client(&config_path)?;
            commands::report::stats(&client, json_output).await?;
        }

        Commands::Version => {
            println!("nms cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Client for the current context, layered over environment settings.
fn api_client(config_path: &std::path::Path) -> anyhow::Result<nms_client::NmsClient> {
    let config = config::ClientConfig::load(config_path)?;
    let ctx = config.require_current()?;
    tracing::debug!(context = %ctx.name, "using context");
    ctx.client(ClientSettings::from_env())
}
