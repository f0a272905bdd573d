//! Configuration loading for sdtdctl.
//!
//! Every connection setting is resolved from three fallback sources (highest
//! wins):
//!
//! 1. **CLI flag** — `--host`, `--token-name`, `--token-secret`, `--insecure`
//! 2. **Environment variables** — `SDTD_HOST`, `SDTD_TOKEN_NAME`,
//!    `SDTD_TOKEN_SECRET`
//! 3. **YAML config file** — path via `--config <path>`, the `SDTD_CONFIG`
//!    environment variable, or `~/.sdtd_client/config.yaml` if it exists
//!
//! The file mirrors the flag names:
//!
//! ```yaml
//! host: https://game.example.com:8080
//! token-name: admin
//! token-secret: hunter2
//! insecure: false
//! ```
//!
//! Resolution only merges values; required-field validation (host scheme,
//! non-empty credentials) happens in [`crate::client::SdtdClient::new`].

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// CLI arguments parsed by `clap`.
#[derive(Parser)]
#[command(name = "sdtdctl", version, about = "A 7 Days to Die web API client")]
pub struct Cli {
    /// Path to config file (default: ~/.sdtd_client/config.yaml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the API, e.g. http://127.0.0.1:8080 [env: SDTD_HOST]
    #[arg(long, short = 'H', global = true)]
    pub host: Option<String>,

    /// Name of the API token to use [env: SDTD_TOKEN_NAME]
    #[arg(long, short = 'n', global = true)]
    pub token_name: Option<String>,

    /// The API token secret to use [env: SDTD_TOKEN_SECRET]
    #[arg(long, short = 's', global = true)]
    pub token_secret: Option<String>,

    /// Skip TLS certificate verification (for self-signed server certs)
    #[arg(long, global = true)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the server configuration (serverconfig.xml) as a table.
    Serverinfo,
    /// Show the current game time and player/animal/hostile counts.
    Serverstats,
    /// Show the game preferences with their defaults.
    Gameprefs,
    /// Player queries.
    #[command(subcommand)]
    Player(PlayerCommands),
    /// Retrieve a window of the server log.
    Log {
        /// Number of lines to fetch (server default 50). Negative fetches
        /// backwards from --first-line.
        #[arg(long, short = 'C', allow_hyphen_values = true)]
        count: Option<i64>,
        /// First line number to fetch. Defaults to the oldest stored line
        /// when count is positive, the most recent when negative.
        #[arg(long, short = 'F')]
        first_line: Option<i64>,
    },
    /// Whitelist management.
    #[command(subcommand)]
    Whitelist(WhitelistCommands),
}

#[derive(Subcommand)]
pub enum PlayerCommands {
    /// List players known to the server.
    List {
        /// Include offline players (requires Alloc's Server Fixes).
        #[arg(long, short = 'O')]
        offline: bool,
    },
}

#[derive(Subcommand)]
pub enum WhitelistCommands {
    /// Add a user to the whitelist.
    Adduser { name: String, id: String },
    /// Remove a user from the whitelist.
    Deleteuser { id: String },
}

/// Raw YAML config file structure. All keys optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileConfig {
    pub host: Option<String>,
    pub token_name: Option<String>,
    pub token_secret: Option<String>,
    pub insecure: Option<bool>,
}

/// Merged connection settings ready for client construction.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub host: String,
    pub token_name: String,
    pub token_secret: String,
    pub insecure: bool,
}

/// Resolve connection settings from CLI flags, env vars, and the config file.
pub fn resolve(cli: &Cli) -> Result<ResolvedConfig, String> {
    let file = load_file_config(cli.config.as_ref())?;
    Ok(merge(cli, file))
}

fn merge(cli: &Cli, file: FileConfig) -> ResolvedConfig {
    ResolvedConfig {
        host: cli
            .host
            .clone()
            .or_else(|| env_var("SDTD_HOST"))
            .or(file.host)
            .unwrap_or_default(),
        token_name: cli
            .token_name
            .clone()
            .or_else(|| env_var("SDTD_TOKEN_NAME"))
            .or(file.token_name)
            .unwrap_or_default(),
        token_secret: cli
            .token_secret
            .clone()
            .or_else(|| env_var("SDTD_TOKEN_SECRET"))
            .or(file.token_secret)
            .unwrap_or_default(),
        insecure: cli.insecure || file.insecure.unwrap_or(false),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn load_file_config(flag: Option<&PathBuf>) -> Result<FileConfig, String> {
    let path = if let Some(path) = flag {
        Some(expand_tilde(path))
    } else if let Ok(path) = std::env::var("SDTD_CONFIG") {
        Some(expand_tilde(&PathBuf::from(path)))
    } else {
        // The default location is optional; only read it if present.
        default_config_path().filter(|p| p.exists())
    };

    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read config file {}: {}", path.display(), e))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| format!("failed to parse config file {}: {}", path.display(), e))
}

fn default_config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".sdtd_client").join("config.yaml"))
}

/// Expand a leading `~` to `$HOME`.
fn expand_tilde(path: &PathBuf) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.clone()
}
