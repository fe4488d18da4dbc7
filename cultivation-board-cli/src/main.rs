//! Cultivation board CLI.
//!
//! Commands:
//! - `cultivation-board board`: print every stage with its areas
//! - `cultivation-board move <area> --to-stage <id> | --onto-area <id>`
//! - `cultivation-board stages`
//! - `cultivation-board facilities`
//! - `cultivation-board batches <area>`
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cultivation_board::{BoardConfig, BoardSession, HttpBoardApi};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::StderrNotifier;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("cultivation_board=debug,cultivation_board_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(result_to_exit(run(cli).await));
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = BoardConfig::load().context("failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }

    let api = HttpBoardApi::from_config(&config).context("failed to build the HTTP client")?;
    let session = BoardSession::new(Arc::new(api), Arc::new(StderrNotifier), &config);
    let ctx = commands::request_context(&cli);
    tracing::debug!(api = %config.api_base_url, ?ctx, "running command");

    match &cli.command {
        Commands::Board => commands::run_board(&session, &ctx).await,
        Commands::Move(args) => commands::run_move(&session, &ctx, args).await,
        Commands::Stages => commands::run_stages(&session, &ctx).await,
        Commands::Facilities => commands::run_facilities(&session, &ctx).await,
        Commands::Batches { area } => commands::run_batches(&session, &ctx, *area).await,
    }
}

/// Convert a command result to an exit code.
fn result_to_exit(result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    }
}
