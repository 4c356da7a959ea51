//! Tapedeck CLI Application
//!
//! Command-line interface for the tapedeck recording store.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use tapedeck_core::{params::ListChildren, LocalDbBuilder};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let db = LocalDbBuilder::new()
        .with_database_path(database_file)
        .build()
        .context("Failed to configure database")?;

    let renderer = TerminalRenderer::new(!no_color);

    info!("Tapedeck started with database {}", db.path().display());

    let cli = Cli::new(db, renderer);
    match command {
        Some(Node { command }) => cli.handle_node_command(command).await,
        Some(Chunk { command }) => cli.handle_chunk_command(command).await,
        Some(Record { command }) => cli.handle_record_command(command).await,
        Some(Clear(args)) => cli.clear(&args).await,
        Some(Reset(args)) => cli.reset(&args).await,
        Some(Status) => cli.status().await,
        None => cli.list_children(&ListChildren::default()).await,
    }
}
