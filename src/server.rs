//! The interactive web shell.
//!
//! A single page with a PDF upload control. Submitting the form posts the
//! file to `/extract`, which runs the pipeline and re-renders the same page
//! with either the generated form or an inline error. Failures never take
//! the server down; the page is immediately usable for the next upload.
//!
//! | Route          | Method | Response                                  |
//! |----------------|--------|-------------------------------------------|
//! | `/`            | GET    | upload page                               |
//! | `/extract`     | POST   | upload page + form or error (multipart)   |
//! | `/health`      | GET    | JSON status                               |

use crate::config::ServerConfig;
use crate::error::Pdf2FormError;
use crate::extract::FormExtractor;
use crate::pipeline::input::Upload;
use crate::pipeline::render::PageTemplate;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Name of the multipart field carrying the PDF.
pub const UPLOAD_FIELD: &str = "file";

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<FormExtractor>,
    /// Bounds how many uploads run the pipeline at once.
    pub permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(extractor: FormExtractor, server: &ServerConfig) -> Self {
        Self {
            extractor: Arc::new(extractor),
            permits: Arc::new(Semaphore::new(server.max_concurrent_uploads.max(1))),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Server binding error
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Server error
    #[error("Server error: {0}")]
    Serve(String),
}

/// GET / - The empty upload page.
async fn index() -> Response {
    page_response(StatusCode::OK, &PageTemplate::empty())
}

/// POST /extract - Run the pipeline on the uploaded PDF.
async fn extract(State(state): State<AppState>, multipart: Multipart) -> Response {
    match run_upload(&state, multipart).await {
        Ok(form_html) => page_response(StatusCode::OK, &PageTemplate::success(form_html)),
        Err(e) => {
            warn!("Upload failed: {}", e);
            page_response(status_for(&e), &PageTemplate::failure(&e))
        }
    }
}

async fn run_upload(state: &AppState, mut multipart: Multipart) -> Result<String, Pdf2FormError> {
    let mut file: Option<(Vec<u8>, Option<String>, Option<String>)> = None;

    let limit = state.extractor.config().max_upload_bytes;
    let reject = |e: MultipartError| map_multipart_error(e, limit);

    while let Some(field) = multipart.next_field().await.map_err(reject)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(reject)?;
        file = Some((bytes.to_vec(), content_type, file_name));
    }

    let (bytes, content_type, file_name) = file.ok_or(Pdf2FormError::EmptyUpload)?;
    info!(
        "Received upload {} ({} bytes)",
        file_name.as_deref().unwrap_or("<unnamed>"),
        bytes.len()
    );

    let _permit = state
        .permits
        .acquire()
        .await
        .map_err(|e| Pdf2FormError::Internal(format!("upload queue closed: {e}")))?;

    let upload = Upload {
        bytes: &bytes,
        content_type: content_type.as_deref(),
        file_name: file_name.as_deref(),
    };
    let output = state.extractor.extract_from_upload(upload).await?;
    Ok(output.html)
}

fn map_multipart_error(e: MultipartError, limit: usize) -> Pdf2FormError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Pdf2FormError::UploadTooLarge { limit }
    } else {
        Pdf2FormError::Internal(format!("invalid upload: {}", e.body_text()))
    }
}

/// GET /health - Liveness check.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.extractor.config().model_or_default().to_string(),
    })
}

/// HTTP status matching a pipeline failure.
pub fn status_for(err: &Pdf2FormError) -> StatusCode {
    match err {
        Pdf2FormError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        Pdf2FormError::UnsupportedContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Pdf2FormError::MalformedResponse { .. } | Pdf2FormError::DegenerateExtraction => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Pdf2FormError::LlmApiError { .. } => StatusCode::BAD_GATEWAY,
        Pdf2FormError::ApiTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn page_response(status: StatusCode, page: &PageTemplate) -> Response {
    match page.render_page() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.extractor.config().max_upload_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/", get(index))
        .route("/extract", post(extract))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve the web shell until Ctrl-C.
pub async fn start_server(extractor: FormExtractor, config: ServerConfig) -> Result<(), ServerError> {
    let app = create_router(AppState::new(extractor, &config));

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl-C handler: {}", e);
    }
}
