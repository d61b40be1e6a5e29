//! Main entry point for the Lara CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lara::cli::commands::{self, Commands};
use lara::{ClientConfig, Credentials, Translator};

/// Lara Translate - command-line client
#[derive(Parser, Debug)]
#[command(name = "lara", version, about, long_about = None)]
struct Args {
    /// Access key id (defaults to LARA_ACCESS_KEY_ID env var)
    #[arg(long)]
    access_key_id: Option<String>,

    /// Access key secret (defaults to LARA_ACCESS_KEY_SECRET env var)
    #[arg(long)]
    access_key_secret: Option<String>,

    /// API server URL (defaults to LARA_SERVER_URL or the production endpoint)
    #[arg(long)]
    server_url: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lara={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = args.command else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env()?,
    };
    if let Some(server_url) = args.server_url {
        config.server_url = server_url;
    }

    let credentials = match (args.access_key_id, args.access_key_secret) {
        (Some(id), Some(secret)) => Credentials::new(id, secret),
        _ => Credentials::from_env(),
    };
    if credentials.is_anonymous() {
        tracing::warn!("No credentials configured, requests will be unsigned");
    }

    let translator = Translator::new(credentials, config)?;
    commands::run(&translator, command).await
}
