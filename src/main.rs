use anyhow::{Context, Result};
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::EnvFilter;

use expense_tracker::{Config, ExpenseStore, Menu, VERSION};

fn main() -> Result<()> {
    // Diagnostics go to stderr so they never interleave with the menu
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
        ))
        .with_writer(io::stderr)
        .init();

    let config = Config::default();
    info!(version = VERSION, db = %config.db_path.display(), "starting expense tracker");

    let store = ExpenseStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&store, &config, stdin.lock(), stdout.lock()).run()?;

    Ok(())
}
