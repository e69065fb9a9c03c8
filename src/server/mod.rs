//! HTTP front-end: `POST /generar-pptx`.
//!
//! The body is parsed as JSON whatever its content type. Rendering is
//! blocking (image downloads, zip writing) and runs on tokio's blocking pool;
//! each request gets its own HTTP client and output file. Every failure is
//! answered with a 500 and the error message as plain text.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::pipeline;
use crate::data::HttpImageFetcher;
use crate::domain::DeckConfig;
use crate::error::{AppError, EXIT_CONFIG, EXIT_RENDER};

pub const PPTX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

pub fn router(config: DeckConfig) -> Router {
    Router::new()
        .route("/generar-pptx", post(generate_pptx))
        .with_state(Arc::new(config))
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, config: DeckConfig) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to bind '{addr}': {e}")))?;
    let local = listener
        .local_addr()
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to read bound address: {e}")))?;
    info!(
        "Listening - addr={}, temp_dir={}, logo={}",
        local,
        config.temp_dir.display(),
        config.logo_url.as_deref().unwrap_or("none")
    );

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable, serving until killed: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn generate_pptx(State(config): State<Arc<DeckConfig>>, body: Bytes) -> Result<Response, AppError> {
    let start = Instant::now();
    let input: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::input(format!("Request body is not valid JSON: {e}")))?;

    let filename = format!("reporte_{}.pptx", Uuid::new_v4());
    info!("Request accepted - file={}, bytes={}", filename, body.len());

    let task_config = Arc::clone(&config);
    let task_filename = filename.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let fetcher = HttpImageFetcher::from_config(&task_config)?;
        pipeline::generate_pptx(&input, &task_filename, &task_config, &fetcher)
    })
    .await
    .map_err(|e| AppError::new(EXIT_RENDER, format!("Render task failed: {e}")))??;

    let bytes = tokio::fs::read(&summary.path).await.map_err(|e| {
        AppError::new(
            EXIT_RENDER,
            format!("Failed to read generated deck '{}': {e}", summary.path.display()),
        )
    })?;

    info!(
        "Request served - file={}, slides={}, bytes={}, duration={:.2}s",
        filename,
        summary.slides,
        bytes.len(),
        start.elapsed().as_secs_f32()
    );

    let headers = [
        (header::CONTENT_TYPE, PPTX_CONTENT_TYPE.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ];
    Ok((headers, bytes).into_response())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed - code={}, message={}", self.exit_code(), self.message());
        (StatusCode::INTERNAL_SERVER_ERROR, self.message().to_string()).into_response()
    }
}
