//! # sdtdctl
//!
//! Command-line client for the 7 Days to Die dedicated-server web API.
//! Authenticates with a static token pair, auto-detects Alloc's Server Fixes
//! during connect, and renders results as tables.
//!
//! ## Architecture
//!
//! ```text
//! main.rs     — entry point, tracing init, connect, command dispatch
//! config.rs   — CLI flags + YAML file / env-var configuration loading
//! client.rs   — HTTP client: auth headers, dispatch, capability negotiation
//! types.rs    — typed response shapes for each endpoint
//! commands.rs — per-subcommand handlers and table rendering
//! ```
//!
//! ## Commands
//!
//! - `serverinfo`, `serverstats`, `gameprefs` — server state tables
//! - `player list [--offline]` — online players, or all known players
//!   (`--offline` requires Alloc's Server Fixes)
//! - `log [--count N] [--first-line N]` — server log window
//! - `whitelist adduser <name> <id>` / `whitelist deleteuser <id>`

mod client;
mod commands;
mod config;
mod types;

use clap::Parser;

use client::{Auth, SdtdClient};
use config::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Tables go to stdout; diagnostics stay on stderr.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = match config::resolve(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("sdtdctl: configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client = match SdtdClient::new(
        cfg.host,
        Auth::new(cfg.token_name, cfg.token_secret),
        !cfg.insecure,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("sdtdctl: {e}");
            std::process::exit(1);
        }
    };

    // Verifies credentials and fixes the capability flag for this run.
    let client = match client.connect().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("sdtdctl: failed to connect: {e}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Serverinfo => commands::serverinfo(&client).await,
        Commands::Serverstats => commands::serverstats(&client).await,
        Commands::Gameprefs => commands::gameprefs(&client).await,
        Commands::Player(cmd) => commands::player(&client, cmd).await,
        Commands::Log { count, first_line } => commands::log(&client, *count, *first_line).await,
        Commands::Whitelist(cmd) => commands::whitelist(&client, cmd).await,
    };

    if let Err(err) = result {
        if err.is_allocs_missing() {
            eprintln!("This command requires Alloc's Server Fixes to be installed on the server.");
        } else {
            eprintln!("sdtdctl: {err}");
        }
        std::process::exit(1);
    }
}
