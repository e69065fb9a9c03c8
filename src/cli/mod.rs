//! Command-line parsing for the media monitoring deck service.
//!
//! Every option has an environment fallback (loaded from `.env` by
//! `app::run` before parsing), so the service can be configured without
//! flags. Parsed options are folded into an immutable `DeckConfig`.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};

use crate::deck::Rgb;
use crate::domain::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PAGE_SIZE, DeckConfig, Theme};
use crate::error::{AppError, EXIT_CONFIG};
use crate::report::format::is_valid_date_format;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "media-deck", version, about = "Media monitoring report to PowerPoint deck service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service (`POST /generar-pptx`).
    Serve(ServeArgs),
    /// Render a JSON report file to a .pptx without starting the service.
    Render(RenderArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "DECK_BIND", default_value = "0.0.0.0:8000")]
    pub bind: String,

    #[command(flatten)]
    pub deck: DeckArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Report JSON (same body the service accepts).
    #[arg(short, long, value_name = "JSON")]
    pub input: PathBuf,

    /// Output file. Defaults to `reporte_<uuid>.pptx` in the temp directory.
    #[arg(short, long, value_name = "PPTX")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub deck: DeckArgs,
}

/// Rendering options shared by both subcommands.
#[derive(Debug, Args, Clone)]
pub struct DeckArgs {
    /// Directory for downloaded images and generated decks.
    #[arg(long, env = "DECK_TEMP_DIR", value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Logo placed on every slide.
    #[arg(long, env = "DECK_LOGO_URL", value_name = "URL")]
    pub logo_url: Option<String>,

    /// Per-image download timeout.
    #[arg(long, env = "DECK_FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Stories per coverage slide.
    #[arg(
        long,
        env = "DECK_PAGE_SIZE",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub page_size: usize,

    /// Currency code appended to VPE/VC values.
    #[arg(long, env = "DECK_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Cover title.
    #[arg(long, env = "DECK_TITLE")]
    pub title: Option<String>,

    /// Output format for story dates (chrono syntax).
    #[arg(long, env = "DECK_DATE_FORMAT", default_value = "%d/%m/%Y")]
    pub date_format: String,

    #[arg(long, env = "DECK_PRIMARY_COLOR", value_name = "#RRGGBB")]
    pub primary_color: Option<Rgb>,

    #[arg(long, env = "DECK_SECONDARY_COLOR", value_name = "#RRGGBB")]
    pub secondary_color: Option<Rgb>,

    #[arg(long, env = "DECK_ACCENT_COLOR", value_name = "#RRGGBB")]
    pub accent_color: Option<Rgb>,
}

impl DeckArgs {
    pub fn to_config(&self) -> Result<DeckConfig, AppError> {
        if !is_valid_date_format(&self.date_format) {
            return Err(AppError::new(
                EXIT_CONFIG,
                format!("Invalid date format '{}'.", self.date_format),
            ));
        }

        let defaults = DeckConfig::default();
        let theme = Theme {
            primary_color: self.primary_color.unwrap_or(defaults.theme.primary_color),
            secondary_color: self.secondary_color.unwrap_or(defaults.theme.secondary_color),
            accent_color: self.accent_color.unwrap_or(defaults.theme.accent_color),
            ..defaults.theme
        };

        let temp_dir = self.temp_dir.clone().unwrap_or(defaults.temp_dir);
        if !temp_dir.is_dir() {
            return Err(AppError::new(
                EXIT_CONFIG,
                format!("Temp directory '{}' does not exist.", temp_dir.display()),
            ));
        }

        Ok(DeckConfig {
            theme,
            report_title: self.title.clone().unwrap_or(defaults.report_title),
            page_size: self.page_size,
            currency_suffix: self.currency.trim().to_string(),
            date_output_format: self.date_format.clone(),
            logo_url: self.logo_url.clone().filter(|u| !u.trim().is_empty()),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            temp_dir,
        })
    }
}
