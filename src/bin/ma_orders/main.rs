//! Command line client of the moving-average order vault.
//!
//! Lists the linked account's orders and the price-feed orders, keeps them
//! refreshed, and submits transfers and deposits.

mod app;
mod config;
mod error;
mod view;

use std::process::exit;

use clap::Parser;
use tracing::error;

use app::App;
use config::{CliConfig, EnvConfig};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = match App::try_new(&env_config).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            exit(1);
        }
    };

    if let Err(e) = app.run(cli_config.command).await {
        error!(%e, "Command failed");
        exit(1);
    }
}
