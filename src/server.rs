//! HTTP service: progress page, metadata endpoint, streamed PDF download.
//!
//! Thin plumbing around the library: the interesting work happens in
//! `wattpad` and `pdf`. The download route bridges the assembler's
//! synchronous `Write` sink to the response body through a channel, so the
//! client receives pages while later chapters are still being pressed.

use crate::config::{Config, OutputConfig};
use crate::error::FetchError;
use crate::pdf;
use crate::utils::sanitize_filename;
use crate::wattpad::WattpadClient;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Browser progress page, embedded so the binary is self-contained.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Bytes buffered before a chunk is handed to the response body.
const STREAM_CHUNK_BYTES: usize = 8 * 1024;

#[derive(Clone)]
struct AppState {
    client: Arc<WattpadClient>,
    output: OutputConfig,
}

/// Runs the HTTP server until the process is stopped.
pub async fn serve(config: Config) -> crate::error::Result<()> {
    let client = Arc::new(WattpadClient::new(config.scraping.clone())?);
    let state = AppState {
        client,
        output: config.output.clone(),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/story/:id", get(story_info))
        .route("/api/story/:id/pdf", get(story_pdf))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "OK"
}

async fn story_info(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.client.story(&id).await {
        Ok(info) => Json(info).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn story_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let info = match state.client.story(&id).await {
        Ok(info) => info,
        Err(err) => return error_response(&err),
    };

    let filename = format!("{}.pdf", sanitize_filename(&info.title));
    tracing::info!(story = info.id, chapters = info.parts.len(), "pressing story");

    // The whole bundle is fetched before the response starts, so upstream
    // failures are already placeholders by the time headers go out. Assembly
    // itself streams: pages reach the client as they are finished.
    let bundle = state.client.fetch_bundle(info).await;
    let output = state.output.clone();

    let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
    tokio::task::spawn_blocking(move || {
        let sink = ChannelWriter::new(tx);
        if let Err(err) = pdf::assemble(&bundle, &output, sink) {
            // Typically the client went away mid-download.
            tracing::warn!(error = %err, "pdf stream aborted");
        }
    });

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|chunk| (Ok::<_, std::convert::Infallible>(chunk), rx))
    });

    let disposition = HeaderValue::try_from(format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"story.pdf\""));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

fn error_response(err: &FetchError) -> Response {
    let status = match err {
        FetchError::NotFound(_) => StatusCode::NOT_FOUND,
        FetchError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// `Write` sink that forwards filled chunks to an async channel.
///
/// Used from the blocking pool, so `blocking_send` is safe here. A closed
/// receiver (client disconnect) surfaces as `BrokenPipe`, which aborts the
/// assembler cleanly.
struct ChannelWriter {
    tx: mpsc::Sender<Vec<u8>>,
    buf: Vec<u8>,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(STREAM_CHUNK_BYTES),
        }
    }

    fn send_buf(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.buf);
        self.tx
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body closed"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= STREAM_CHUNK_BYTES {
            self.send_buf()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buf()
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        let _ = self.send_buf();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_writer_delivers_all_bytes() {
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
        let payload: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let writer_task = tokio::task::spawn_blocking(move || {
            let mut writer = ChannelWriter::new(tx);
            writer.write_all(&payload).unwrap();
            writer.flush().unwrap();
        });

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.extend_from_slice(&chunk);
        }
        writer_task.await.unwrap();

        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_channel_writer_reports_disconnect() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(1);
        drop(rx);

        let result = tokio::task::spawn_blocking(move || {
            let mut writer = ChannelWriter::new(tx);
            writer.write_all(&vec![0u8; STREAM_CHUNK_BYTES * 2])?;
            writer.flush()
        })
        .await
        .unwrap();

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_error_status_mapping() {
        let not_found = error_response(&FetchError::NotFound("story 1".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_input = error_response(&FetchError::InvalidUrl("x".into()));
        assert_eq!(bad_input.status(), StatusCode::BAD_REQUEST);

        let upstream = error_response(&FetchError::Parse("boom".into()));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }
}
