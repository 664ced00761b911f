// Logosmith - credit-gated logo generation service
// Entry point and command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use logosmith::app::AppState;
use logosmith::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "logosmith", version, about = "Logo generation service")]
struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true, env = "LOGOSMITH_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve,
    /// Provision a profile and session token for local use
    CreateUser {
        #[arg(long, default_value_t = 0)]
        credits: i64,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logosmith=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    tracing::info!("Starting Logosmith");
    let state = AppState::initialize(&settings)
        .await
        .context("initializing application")?;

    match cli.command {
        Command::Serve => {
            logosmith::api::serve(state, &settings.server.host, settings.server.port).await?;
        }
        Command::CreateUser { credits } => {
            let (profile, session) = state.profiles.provision_user(credits).await?;
            println!("user_id: {}", profile.user_id);
            println!("credits: {}", profile.credits);
            println!("token:   {}", session.token);
        }
    }

    Ok(())
}
