//! jobtrack - command-line client for the job tracker

mod commands;
mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use commands::Commands;
use config::Settings;
use jobtrack_http::{ClientError, FileTokenStore, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Track job postings and applications")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short = 'c', long, global = true, env = "JOBTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Set logging level (defaults to the configured level)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.api.base_url = base_url;
    }

    let level = cli
        .log_level
        .map_or_else(|| settings.log_level.clone(), |level| level.as_str().to_string());
    logging::init_logging(&level, cli.json_logs)?;

    let token_path = settings.token_path();
    debug!(path = %token_path.display(), "Using token file");
    let tokens = FileTokenStore::open(&token_path)
        .with_context(|| format!("Failed to open token file {}", token_path.display()))?;

    let client = settings
        .api
        .builder()?
        .token_store(Arc::new(tokens))
        .build()?;
    let session = Session::bootstrap(client).await;

    if let Err(e) = cli.command.execute(&session).await {
        let expired = e
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_auth_expired);
        error!("Command failed: {e:#}");
        if expired {
            eprintln!("Session expired, run `jobtrack login`");
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "jobtrack",
            "--base-url",
            "https://jobs.example.com",
            "applications",
            "withdraw",
            "12",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("https://jobs.example.com"));
        assert!(matches!(cli.command, Commands::Applications { .. }));
    }
}
