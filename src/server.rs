//! HTTP surface: health probes and `PUT /process`.
//!
//! ```text
//! GET  /         service banner + readiness
//! GET  /health   readiness
//! PUT  /process  raw PDF body → transcript JSON
//! ```
//!
//! `/process` takes the PDF as the raw request body, not multipart.
//! `X-Filename` names the upload (default `document.pdf`); `Authorization`
//! is accepted and ignored.

use crate::error::LoaderError;
use crate::output::ProcessOutput;
use crate::pipeline::input::Upload;
use crate::process::Pipeline;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Name reported on `GET /`.
pub const SERVICE_NAME: &str = "OpenWebUI Document Loader";

const FILENAME_HEADER: &str = "x-filename";

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'static str>,
    ocr_configured: bool,
    azure_configured: bool,
    cleanup_failures: u64,
}

impl ServiceStatus {
    fn of(pipeline: &Pipeline) -> Self {
        Self {
            status: "healthy",
            service: None,
            ocr_configured: pipeline.ocr_configured(),
            azure_configured: pipeline.ocr_configured(),
            cleanup_failures: pipeline.cleanup_failures(),
        }
    }
}

/// Build the application router.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let body_limit = pipeline.config().max_upload_bytes;
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/process", put(process_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(pipeline))
}

/// Serve the router on `addr` until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, pipeline: Arc<Pipeline>) -> std::io::Result<()> {
    let app = router(Arc::clone(&pipeline));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", listener.local_addr()?);
    if !pipeline.ocr_configured() {
        warn!("OCR credentials missing: PUT /process will answer 500 until configured");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn root_handler(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        service: Some(SERVICE_NAME),
        ..ServiceStatus::of(&state.pipeline)
    })
}

async fn health_handler(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus::of(&state.pipeline))
}

async fn process_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ProcessOutput>, ApiError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let start = Instant::now();

    let body = body.map_err(|rejection| {
        let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            LoaderError::UploadTooLarge {
                limit: state.pipeline.config().max_upload_bytes,
            }
        } else {
            LoaderError::invalid_input(rejection.body_text())
        };
        warn!(request_id = %request_id, category = err.category(), "Body rejected: {}", err);
        ApiError(err)
    })?;

    let upload = Upload {
        bytes: body.to_vec(),
        filename: header_value(&headers, FILENAME_HEADER),
        content_type: header_value(&headers, header::CONTENT_TYPE.as_str()),
    };
    info!(
        request_id = %request_id,
        filename = upload.filename(),
        bytes = upload.bytes.len(),
        "Processing request"
    );

    match state.pipeline.process_upload(upload).await {
        Ok(output) => {
            info!(
                request_id = %request_id,
                pages = output.metadata.pages,
                total_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
            Ok(Json(output))
        }
        Err(e) => {
            error!(
                request_id = %request_id,
                category = e.category(),
                error = %e,
                "Request failed"
            );
            Err(ApiError(e))
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// A [`LoaderError`] rendered as `{"detail": ..., "category": ...}`.
#[derive(Debug)]
pub struct ApiError(pub LoaderError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    category: &'static str,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            LoaderError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            LoaderError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            LoaderError::MalformedDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LoaderError::ServiceError { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LoaderError> for ApiError {
    fn from(e: LoaderError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.0.to_string(),
            category: self.0.category(),
        };
        (status, Json(body)).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
