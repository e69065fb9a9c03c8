//! Best-effort image downloads for chart slides and the logo.
//!
//! A fetch never fails the render: every transport problem is folded into
//! `FetchOutcome::Failed` so callers can fall back to a placeholder.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::DeckConfig;
use crate::error::{AppError, EXIT_CONFIG};

/// Why an image could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout,
    Connect(String),
    InvalidUrl(String),
    /// Anything other than `200 OK`.
    Status(u16),
    Transport(String),
    /// The body arrived but could not be written to disk.
    Storage(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Timeout => write!(f, "request timed out"),
            FetchFailure::Connect(e) => write!(f, "connection failed: {e}"),
            FetchFailure::InvalidUrl(e) => write!(f, "invalid URL: {e}"),
            FetchFailure::Status(code) => write!(f, "unexpected HTTP status {code}"),
            FetchFailure::Transport(e) => write!(f, "request failed: {e}"),
            FetchFailure::Storage(e) => write!(f, "could not store image: {e}"),
        }
    }
}

/// A downloaded image living in a uniquely named temp file.
///
/// The file is removed by [`TempImage::discard`] or, failing that, on drop.
#[derive(Debug)]
pub struct TempImage {
    file: NamedTempFile,
}

impl TempImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.path())
    }

    /// Delete the file now, logging (not returning) any error.
    pub fn discard(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!("Failed to remove temp image {}: {e}", path.display());
        }
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(TempImage),
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched(_))
    }
}

/// Source of slide images. The HTTP implementation is the only production
/// one; tests swap in in-memory fetchers.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> FetchOutcome;
}

/// One blocking GET per image, with a fixed timeout and no retries.
pub struct HttpImageFetcher {
    client: Client,
    temp_dir: PathBuf,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration, temp_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            temp_dir: temp_dir.into(),
        })
    }

    pub fn from_config(config: &DeckConfig) -> Result<Self, AppError> {
        Self::new(config.fetch_timeout, config.temp_dir.clone())
    }

    fn try_fetch(&self, url: &str) -> Result<TempImage, FetchFailure> {
        let resp = self.client.get(url).send().map_err(classify_error)?;

        if resp.status() != StatusCode::OK {
            return Err(FetchFailure::Status(resp.status().as_u16()));
        }

        let bytes = resp.bytes().map_err(classify_error)?;
        store_temp_image(&self.temp_dir, &bytes)
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> FetchOutcome {
        let start = std::time::Instant::now();
        match self.try_fetch(url) {
            Ok(image) => {
                debug!(
                    "Image fetched - url={}, path={}, duration={:.2}s",
                    url,
                    image.path().display(),
                    start.elapsed().as_secs_f32()
                );
                FetchOutcome::Fetched(image)
            }
            Err(reason) => {
                warn!("Image fetch failed - url={}, reason={}", url, reason);
                FetchOutcome::Failed(reason)
            }
        }
    }
}

fn classify_error(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::Timeout
    } else if err.is_builder() {
        FetchFailure::InvalidUrl(err.to_string())
    } else if err.is_connect() {
        FetchFailure::Connect(err.to_string())
    } else {
        FetchFailure::Transport(err.to_string())
    }
}

/// Persist `bytes` to a fresh temp file under `dir`. Nothing is left behind
/// when writing fails.
pub fn store_temp_image(dir: &Path, bytes: &[u8]) -> Result<TempImage, FetchFailure> {
    let mut file = tempfile::Builder::new()
        .prefix("deck-img-")
        .suffix(".img")
        .tempfile_in(dir)
        .map_err(|e| FetchFailure::Storage(e.to_string()))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| FetchFailure::Storage(e.to_string()))?;
    Ok(TempImage { file })
}


#[cfg(test)]
mod tests {
    use super::test_server::*;
    use super::*;
    use crate::deck::png_fixture;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn ok_response_is_written_to_a_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let body = png_fixture(8, 4);
        let base = serve_once("200 OK", body.clone());
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5), dir.path()).unwrap();

        let FetchOutcome::Fetched(image) = fetcher.fetch(&format!("{base}/chart.png")) else {
            panic!("expected a fetched image");
        };
        assert!(image.path().starts_with(dir.path()));
        assert_eq!(image.read().unwrap(), body);
        assert_eq!(entries(dir.path()), 1);

        image.discard();
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn non_200_status_is_a_failure_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = serve_once("404 Not Found", b"missing".to_vec());
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5), dir.path()).unwrap();

        match fetcher.fetch(&format!("{base}/chart.png")) {
            FetchOutcome::Failed(FetchFailure::Status(404)) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn timeout_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let base = serve_silence(Duration::from_secs(3));
        let fetcher = HttpImageFetcher::new(Duration::from_millis(300), dir.path()).unwrap();

        match fetcher.fetch(&format!("{base}/slow.png")) {
            FetchOutcome::Failed(FetchFailure::Timeout) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn connection_refused_and_bad_urls_are_failures() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpImageFetcher::new(Duration::from_secs(2), dir.path()).unwrap();

        assert!(!fetcher.fetch(&closed_port_url()).is_fetched());
        assert!(!fetcher.fetch("not a url at all").is_fetched());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn dropping_a_temp_image_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let image = store_temp_image(dir.path(), b"bytes").unwrap();
        let path = image.path().to_path_buf();
        assert!(path.exists());
        drop(image);
        assert!(!path.exists());
    }
}
