//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into a `DeckConfig`
//! - runs the HTTP service or a one-off render

use std::path::Path;

use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::cli::{Cli, Command, RenderArgs, ServeArgs};
use crate::data::HttpImageFetcher;
use crate::error::{AppError, EXIT_CONFIG, EXIT_RENDER};

pub mod pipeline;

/// Entry point for the `media-deck` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; a malformed one is worth knowing about.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Ignoring .env: {e}");
        }
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Render(args) => handle_render(args),
    }
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = args.deck.to_config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to start async runtime: {e}")))?;
    runtime.block_on(crate::server::serve(&args.bind, config))
}

fn handle_render(args: RenderArgs) -> Result<(), AppError> {
    let config = args.deck.to_config()?;
    let input = read_input(&args.input)?;
    let fetcher = HttpImageFetcher::from_config(&config)?;

    let summary = match &args.output {
        Some(path) => pipeline::render_to_path(&input, path, &config, &fetcher)?,
        None => {
            let filename = format!("reporte_{}.pptx", Uuid::new_v4());
            pipeline::generate_pptx(&input, &filename, &config, &fetcher)?
        }
    };
    info!("Wrote {}", summary.path.display());

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| AppError::new(EXIT_RENDER, format!("Failed to serialize summary: {e}")))?;
    println!("{json}");
    Ok(())
}

fn read_input(path: &Path) -> Result<Value, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to read '{}': {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::input(format!("'{}' is not valid JSON: {e}", path.display())))
}
