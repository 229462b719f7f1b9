//! Error types for the doculoader library.
//!
//! A single fatal error type, [`LoaderError`], covers every way a request can
//! fail. Each variant maps to a stable category string (see
//! [`LoaderError::category`]) so the HTTP layer and log pipelines can match
//! on the category while humans read the `Display` detail.
//!
//! Cleanup failures are the one exception to fail-fast: they are constructed
//! as [`LoaderError::ResourceError`] so they log uniformly, but the
//! orchestrator swallows them once the request itself has succeeded.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the doculoader library.
#[derive(Debug, Error)]
pub enum LoaderError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Request rejected before any processing: empty body, wrong file type.
    #[error("{reason}")]
    InvalidInput { reason: String },

    /// Request body larger than the configured upload limit.
    #[error("Upload exceeds the {limit}-byte limit")]
    UploadTooLarge { limit: usize },

    // ── Document errors ───────────────────────────────────────────────────
    /// The uploaded bytes could not be parsed as a PDF.
    #[error("Malformed PDF document: {detail}")]
    MalformedDocument { detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR service endpoint or credential is missing.
    #[error("Azure Document Intelligence credentials not configured (missing: {missing})")]
    Unconfigured { missing: String },

    /// The OCR engine rejected or failed a page.
    ///
    /// `page` is the page's 1-based index in the uploaded document when the
    /// failure is tied to one page.
    #[error("{}", service_error_message(.page, .detail))]
    ServiceError { page: Option<usize>, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// A temporary file or directory could not be created, written or removed.
    #[error("Temporary storage error at '{path}': {source}")]
    ResourceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install libpdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn service_error_message(page: &Option<usize>, detail: &str) -> String {
    match page {
        Some(page) => format!("OCR service error on page {page}: {detail}"),
        None => format!("OCR service error: {detail}"),
    }
}

impl LoaderError {
    /// Stable, machine-readable category for this error.
    pub fn category(&self) -> &'static str {
        match self {
            LoaderError::InvalidInput { .. } => "invalid_input",
            LoaderError::UploadTooLarge { .. } => "upload_too_large",
            LoaderError::MalformedDocument { .. } => "malformed_document",
            LoaderError::Unconfigured { .. } => "unconfigured",
            LoaderError::ServiceError { .. } => "service_error",
            LoaderError::ResourceError { .. } => "resource_error",
            LoaderError::InvalidConfig(_) => "invalid_config",
            LoaderError::PdfiumBindingFailed(_) | LoaderError::Internal(_) => "internal",
        }
    }

    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        LoaderError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        LoaderError::MalformedDocument {
            detail: detail.into(),
        }
    }

    pub(crate) fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoaderError::ResourceError {
            path: path.into(),
            source,
        }
    }

    /// Attach the original page index to a page-less service error.
    pub(crate) fn on_page(self, original_index: usize) -> Self {
        match self {
            LoaderError::ServiceError { page: None, detail } => LoaderError::ServiceError {
                page: Some(original_index),
                detail,
            },
            other => other,
        }
    }
}
