//! Ragbot - conversational assistant CLI
//!
#![doc = "Ragbot - conversational assistant CLI"]
#![doc = "Main entry point for the ragbot binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ragbot::cli::{Cli, Commands};
use ragbot::commands;
use ragbot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // API keys and RAGBOT_* overrides may live in a local .env file
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/engines.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat {
            generation,
            material,
            load,
        } => {
            tracing::info!("Starting interactive chat");
            if let Some(name) = &load {
                tracing::debug!("Loading session: {}", name);
            }
            commands::chat::run_chat(config, generation, material, load).await?;
            Ok(())
        }
        Commands::Ask {
            generation,
            material,
            source,
        } => {
            tracing::info!("Running one-shot prompt");
            commands::ask::run_ask(config, generation, material, source).await?;
            Ok(())
        }
        Commands::Sessions => {
            commands::sessions::list_sessions(&config)?;
            Ok(())
        }
        Commands::Engines { json } => {
            commands::engines::list_engines(&config, json)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so stdout carries only replies.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ragbot=debug" } else { "ragbot=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
