use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod commands;
mod config;
mod error;
mod events;
mod export;
mod format;
mod models;
mod session;
mod ui;

use config::{Config, BACKEND_URL_ENV};

#[derive(Parser)]
#[command(name = "teller")]
#[command(version)]
#[command(about = "Terminal client for the Smart Bank Assistant", long_about = None)]
struct Cli {
    /// Base URL of the assistant backend
    #[arg(long, global = true, env = BACKEND_URL_ENV)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show recent conversation history
    History,
    /// Clear all conversation history
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Export conversation history to a JSON file
    Export {
        /// Directory to write into (defaults to the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the default configuration to ~/.teller/config.toml
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

/// The TUI owns the terminal, so logs always go to a file
fn init_logging(config: &Config) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .context("Failed to open log file")?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("teller=info")),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    init_logging(&config)?;
    tracing::debug!(backend = %config.backend_url, "configuration loaded");

    match cli.command {
        None => ui::TuiApp::new(&config)?.run().await,
        Some(Commands::Ask { question }) => commands::ask(&config, &question.join(" ")).await,
        Some(Commands::History) => commands::history(&config).await,
        Some(Commands::Clear { yes }) => commands::clear(&config, yes).await,
        Some(Commands::Export { output }) => commands::export(&config, output).await,
        Some(Commands::InitConfig { force }) => commands::init_config(&config, force),
    }
}
