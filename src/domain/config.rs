//! Immutable render configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::deck::Rgb;

/// Colors and fonts shared by every slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Header bar fill and cover emphasis.
    pub primary_color: Rgb,
    /// Footer captions and secondary text lines.
    pub secondary_color: Rgb,
    /// Rule under the header and story bullets.
    pub accent_color: Rgb,
    pub text_color: Rgb,
    pub title_font: String,
    pub body_font: String,
    /// Font sizes in points.
    pub title_size: f32,
    pub body_size: f32,
    pub caption_size: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: Rgb::new(0x1F, 0x38, 0x64),
            secondary_color: Rgb::new(0x59, 0x59, 0x59),
            accent_color: Rgb::new(0x2E, 0x75, 0xB6),
            text_color: Rgb::new(0x26, 0x26, 0x26),
            title_font: "Calibri Light".to_string(),
            body_font: "Calibri".to_string(),
            title_size: 26.0,
            body_size: 16.0,
            caption_size: 10.0,
        }
    }
}

/// Everything a render needs besides the payload itself.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    pub theme: Theme,
    /// Title on the cover slide and in the package metadata.
    pub report_title: String,
    /// Stories per coverage slide.
    pub page_size: usize,
    /// Code appended to monetary values that carry no currency marker.
    pub currency_suffix: String,
    /// `chrono` pattern story dates are rewritten to.
    pub date_output_format: String,
    /// Logo placed in the top-right corner of every slide.
    pub logo_url: Option<String>,
    pub fetch_timeout: Duration,
    /// Where downloaded images and generated decks are written.
    pub temp_dir: PathBuf,
}

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            report_title: "Media Monitoring Report".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            currency_suffix: "USD".to_string(),
            date_output_format: "%d/%m/%Y".to_string(),
            logo_url: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl DeckConfig {
    /// Page size clamped to at least one story per slide.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}
