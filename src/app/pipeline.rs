//! Shared render pipeline used by both the HTTP handler and `media-deck render`.
//!
//! normalize -> plan + build slides (fetching images) -> write package
//!
//! Front-ends only decide where the bytes go afterwards.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::data::ImageFetcher;
use crate::deck::{Deck, Shape};
use crate::domain::DeckConfig;
use crate::error::{AppError, EXIT_CONFIG};
use crate::io::export::write_pptx;
use crate::io::ingest::{ItemWarning, normalize_input};

/// What a finished render produced.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub slides: usize,
    pub charts: usize,
    /// Chart slides that show a placeholder instead of the image.
    pub chart_placeholders: usize,
    pub logo: bool,
    pub warnings: Vec<ItemWarning>,
}

/// Normalize `input` and build the deck in memory.
pub fn build_deck(
    input: &Value,
    config: &DeckConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<(Deck, Vec<ItemWarning>), AppError> {
    let normalized = normalize_input(input)?;
    let deck = crate::report::render_deck(&normalized, config, fetcher);
    Ok((deck, normalized.warnings))
}

/// Render to `<temp dir>/<file name of filename>`.
pub fn generate_pptx(
    input: &Value,
    filename: &str,
    config: &DeckConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<RenderSummary, AppError> {
    let path = output_path(config, filename)?;
    render_to_path(input, &path, config, fetcher)
}

/// Render to an explicit path.
pub fn render_to_path(
    input: &Value,
    path: &Path,
    config: &DeckConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<RenderSummary, AppError> {
    let start = Instant::now();
    let (deck, warnings) = build_deck(input, config, fetcher)?;
    write_pptx(&deck, &config.theme, path)?;

    let summary = summarize(&deck, path, warnings);
    info!(
        "Render finished - path={}, slides={}, charts={}, placeholders={}, warnings={}, duration={:.2}s",
        path.display(),
        summary.slides,
        summary.charts,
        summary.chart_placeholders,
        summary.warnings.len(),
        start.elapsed().as_secs_f32()
    );
    Ok(summary)
}

/// Only the final component of `filename` is used, so callers can't write
/// outside the temp directory.
pub fn output_path(config: &DeckConfig, filename: &str) -> Result<PathBuf, AppError> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| AppError::new(EXIT_CONFIG, format!("Invalid output filename '{filename}'.")))?;
    Ok(config.temp_dir.join(name))
}

fn summarize(deck: &Deck, path: &Path, warnings: Vec<ItemWarning>) -> RenderSummary {
    let mut charts = 0;
    let mut chart_placeholders = 0;
    let mut logo = false;
    for slide in deck.slides() {
        for shape in &slide.shapes {
            match shape {
                Shape::Picture(p) if p.name == "Chart" => charts += 1,
                Shape::Picture(p) if p.name == "Logo" => logo = true,
                Shape::Text(tb) if tb.name == "Chart Placeholder" => {
                    charts += 1;
                    chart_placeholders += 1;
                }
                _ => {}
            }
        }
    }
    RenderSummary {
        path: path.to_path_buf(),
        slides: deck.slides().len(),
        charts,
        chart_placeholders,
        logo,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use serde_json::json;

    use super::*;
    use crate::data::{FetchFailure, FetchOutcome};

    struct NoImages;

    impl ImageFetcher for NoImages {
        fn fetch(&self, _url: &str) -> FetchOutcome {
            FetchOutcome::Failed(FetchFailure::Status(404))
        }
    }

    fn config_in(dir: &Path) -> DeckConfig {
        DeckConfig {
            temp_dir: dir.to_path_buf(),
            ..DeckConfig::default()
        }
    }

    #[test]
    fn generate_writes_into_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let input = json!([{"TV_raw": {"cantidad_noticias": 1}}, "https://x/vc_barra.png", 5]);

        let summary = generate_pptx(&input, "reporte_test.pptx", &config, &NoImages).unwrap();
        assert_eq!(summary.path, dir.path().join("reporte_test.pptx"));
        assert_eq!(summary.slides, 5);
        assert_eq!(summary.charts, 1);
        assert_eq!(summary.chart_placeholders, 1);
        assert!(!summary.logo);
        assert_eq!(summary.warnings.len(), 1);

        let file = std::fs::File::open(&summary.path).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut slide = String::new();
        zip.by_name("ppt/slides/slide5.xml")
            .unwrap()
            .read_to_string(&mut slide)
            .unwrap();
        assert!(slide.contains("VC by Channel"));
        assert!(slide.contains("Chart unavailable"));
    }

    #[test]
    fn filename_directories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert_eq!(
            output_path(&config, "../../etc/out.pptx").unwrap(),
            dir.path().join("out.pptx")
        );
        assert!(output_path(&config, "..").is_err());
    }

    #[test]
    fn input_errors_leave_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let err = generate_pptx(&json!("nope"), "x.pptx", &config, &NoImages).unwrap_err();
        assert!(err.is_input_error());
        assert!(!dir.path().join("x.pptx").exists());
    }

    #[test]
    fn summary_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let summary = generate_pptx(&json!({}), "s.pptx", &config, &NoImages).unwrap();
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["slides"], json!(3));
        assert_eq!(value["warnings"], json!([]));
    }
}
