//! HTTP transport for scanner uploads.
//!
//! - `POST /` and `POST /submit` - raw packet body, replies with the 32-byte digest
//! - `GET /health` - liveness probe

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cwa_lib::CwaError;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::IngestError;
use crate::ingest;
use crate::store::FrameStore;

const OCTET_STREAM: &str = "application/octet-stream";

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn FrameStore>,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        match self {
            // The device compares our digest with its own, so it is sent even on mismatch
            IngestError::Rejected(CwaError::ChecksumMismatch { computed, .. }) => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, OCTET_STREAM)],
                computed.as_bytes().to_vec(),
            )
                .into_response(),
            IngestError::Rejected(e) => {
                (StatusCode::BAD_REQUEST, format!("{}: {}", e.kind(), e)).into_response()
            }
            IngestError::Store(e) => {
                error!("Failed to persist packet: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure").into_response()
            }
            IngestError::Task(e) => {
                error!("Ingest task failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

pub fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/submit", post(submit))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST / and /submit
pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, IngestError> {
    let outcome =
        tokio::task::spawn_blocking(move || ingest::process(state.store.as_ref(), &body)).await??;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, OCTET_STREAM)],
        outcome.checksum.as_bytes().to_vec(),
    )
        .into_response())
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Bind and serve until Ctrl+C.
pub async fn run(
    bind: SocketAddr,
    max_body_bytes: usize,
    store: Arc<dyn FrameStore>,
) -> Result<()> {
    let app = router(Arc::new(AppState { store }), max_body_bytes);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening for uploads on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down gracefully.");
            }
        })
        .await
        .context("Server error")
}
