//! Creative Monitor CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use creative_monitor::{init_tracing, AppState, ClientConfig};

#[derive(Parser)]
#[command(name = "creative-monitor")]
#[command(about = "Client for the advertising creatives analytics API")]
#[command(version)]
struct Cli {
    /// API origin, overriding the config file and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, then print the profile and categories
    Login {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },
    /// Forget the stored session
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = ClientConfig::load().with_api_url_override(cli.api_url);
    tracing::info!("Using API at {}", config.api_url);
    let state = AppState::with_keyring(config).context("Failed to build HTTP client")?;

    match cli.command {
        None => {}
        Some(Commands::Login { email, password }) => {
            state
                .session
                .login(&email, &password)
                .await
                .context("Login failed")?;
        }
        Some(Commands::Logout) => {
            if !state.session.logout()? {
                println!("No active session");
            }
            return Ok(());
        }
    }

    if !state.session.has_session()? {
        bail!("Not logged in; run `creative-monitor login EMAIL PASSWORD`");
    }

    let profile = match state.profile.profile().await {
        Ok(profile) => profile,
        Err(e) if e.is_session_lost() => bail!("Session expired, please log in again"),
        Err(e) => return Err(e).context("Failed to load profile"),
    };
    let categories = state
        .creatives
        .categories()
        .await
        .context("Failed to load categories")?;

    let output = serde_json::json!({
        "profile": profile,
        "categories": categories,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
