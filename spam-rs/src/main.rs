//! spam-rs: Spam detection API server
//!
//! Loads the model bundle once at startup and serves the classification API.
//! A bundle that fails to load stops the process before anything is served.

use clap::{Parser, Subcommand};
use spam_rs::api::{ApiServer, AppState};
use spam_rs::spam::{combine_title_and_message, ModelBundle, SpamDetector};
use spam_rs::{logging, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "spam-rs")]
#[command(about = "Spam detection API", version, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address (e.g., 127.0.0.1:8000)
    #[arg(short, long)]
    listen: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,
    /// Classify one message with the configured bundle and exit
    Predict {
        /// Message body
        message: String,
        /// Optional subject line
        #[arg(short, long, default_value = "")]
        title: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
        config.validate()?;
    }

    logging::init(&config.logging)?;

    info!("Starting spam-rs v{}", env!("CARGO_PKG_VERSION"));

    let bundle = match ModelBundle::load(&config.model.model_path, &config.model.vectorizer_path) {
        Ok(bundle) => Arc::new(bundle),
        Err(e) => {
            error!("Failed to load model bundle: {}", e);
            return Err(e.into());
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = Arc::new(AppState::with_bundle(bundle));
            let server = ApiServer::new(state, &config);
            server.run().await?;
        }
        Commands::Predict { message, title } => {
            let detector = SpamDetector::new(bundle);
            let text = combine_title_and_message(&title, &message);
            let result = detector.predict(&text)?;
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
