#![windows_subsystem = "windows"]

use anyhow::Result;
use tsender::{config::Config, gui};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    // Refuses to start without a wallet connector
    let config = Config::from_env()?;
    tracing::info!("Using wallet connector: {}", config.wallet.display_name());

    gui::launch(config)?;

    Ok(())
}
