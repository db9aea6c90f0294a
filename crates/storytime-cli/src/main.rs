//! StoryTime CLI - a command-line front end for the StoryTime story platform.
//!
//! Browses, writes and bookmarks stories, keeping the signed-in session in
//! a cookie store between runs.

mod cli;
mod commands;
mod utils;

use std::io;

use anyhow::Result;
use storytime_core::{ApiError, Config, Session, StoryClient};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Command;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, cli::USAGE);
            std::process::exit(2);
        }
    };

    let config = Config::load()?;
    info!(api_url = %config.api_url, store = ?config.cookie_store, "StoryTime CLI starting");

    let mut session = Session::restore(config.open_jar()?);
    let client = StoryClient::from_config(&config)?;

    if let Err(e) = commands::run(command, &mut session, &client).await {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_missing_token) {
            eprintln!("Not signed in. Run `storytime login` first.");
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}
