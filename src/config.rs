//! Service configuration.
//!
//! Every knob lives in [`ServiceConfig`], built through its
//! [`ServiceConfigBuilder`]. The binary resolves the values once at start-up
//! (flags, environment, `.env`) and hands the finished config to
//! [`crate::Pipeline`]; nothing re-reads the environment per request.
//!
//! Missing OCR credentials are *not* a build error. A gateway without
//! credentials still starts, reports `ocr_configured: false` on its health
//! endpoint and fails every `/process` call with
//! [`LoaderError::Unconfigured`].

use crate::error::LoaderError;
use std::fmt;
use std::path::PathBuf;

/// Identifier reported in response metadata for the OCR backend.
pub const ENGINE_ID: &str = "azure-document-intelligence";

/// Default Document Intelligence model used for plain OCR.
pub const DEFAULT_MODEL: &str = "prebuilt-read";

/// Default Document Intelligence REST API version.
pub const DEFAULT_API_VERSION: &str = "2024-11-30";

/// Configuration for the OCR gateway.
///
/// # Example
/// ```rust
/// use doculoader::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .ocr_endpoint("https://example.cognitiveservices.azure.com")
///     .ocr_key("secret")
///     .temp_root("/tmp/doculoader")
///     .build()
///     .unwrap();
/// assert!(config.ocr_configured());
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Document Intelligence resource endpoint, e.g.
    /// `https://<name>.cognitiveservices.azure.com`.
    pub ocr_endpoint: Option<String>,

    /// Document Intelligence subscription key.
    pub ocr_key: Option<String>,

    /// Model identifier sent with every page. Default: `prebuilt-read`.
    pub ocr_model: String,

    /// REST API version query parameter. Default: `2024-11-30`.
    pub ocr_api_version: String,

    /// Root under which each request creates its scratch directory.
    /// Default: `/tmp/doculoader`.
    pub temp_root: PathBuf,

    /// OCR calls in flight per request. Default: 1 (strictly sequential).
    ///
    /// Raising it trades OCR quota for latency on long documents. The
    /// transcript order does not depend on it.
    pub concurrency: usize,

    /// Delay between analyze-status polls when the service sends no
    /// `Retry-After`. Default: 1000 ms.
    pub poll_interval_ms: u64,

    /// Deadline for one page's analyze operation, polling included.
    /// Default: 120 s.
    pub ocr_timeout_secs: u64,

    /// Timeout for each individual HTTP call to the OCR service. Default: 60 s.
    pub http_timeout_secs: u64,

    /// Largest accepted request body. Default: 100 MiB.
    pub max_upload_bytes: usize,

    /// Page-boundary marker style in the transcript.
    pub page_marker: PageMarker,

    /// Explicit path to libpdfium. If None, the working directory and
    /// system library paths are searched.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ocr_endpoint: None,
            ocr_key: None,
            ocr_model: DEFAULT_MODEL.to_string(),
            ocr_api_version: DEFAULT_API_VERSION.to_string(),
            temp_root: PathBuf::from("/tmp/doculoader"),
            concurrency: 1,
            poll_interval_ms: 1000,
            ocr_timeout_secs: 120,
            http_timeout_secs: 60,
            max_upload_bytes: 100 * 1024 * 1024,
            page_marker: PageMarker::default(),
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr_key", &self.ocr_key.as_ref().map(|_| "<redacted>"))
            .field("ocr_model", &self.ocr_model)
            .field("ocr_api_version", &self.ocr_api_version)
            .field("temp_root", &self.temp_root)
            .field("concurrency", &self.concurrency)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("page_marker", &self.page_marker)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// True when both the OCR endpoint and key are present.
    pub fn ocr_configured(&self) -> bool {
        self.ocr_endpoint.is_some() && self.ocr_key.is_some()
    }

    /// Names of the missing OCR settings, comma separated, or None.
    pub fn missing_ocr_settings(&self) -> Option<String> {
        let mut missing = Vec::new();
        if self.ocr_endpoint.is_none() {
            missing.push("endpoint");
        }
        if self.ocr_key.is_none() {
            missing.push("key");
        }
        if missing.is_empty() {
            None
        } else {
            Some(missing.join(", "))
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Blank values count as unset.
    pub fn ocr_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.ocr_endpoint = non_blank(endpoint.into())
            .map(|e| e.trim_end_matches('/').to_string());
        self
    }

    /// Blank values count as unset.
    pub fn ocr_key(mut self, key: impl Into<String>) -> Self {
        self.config.ocr_key = non_blank(key.into());
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn ocr_api_version(mut self, version: impl Into<String>) -> Self {
        self.config.ocr_api_version = version.into();
        self
    }

    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.temp_root = root.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs;
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn page_marker(mut self, marker: PageMarker) -> Self {
        self.config.page_marker = marker;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, LoaderError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(LoaderError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.poll_interval_ms == 0 {
            return Err(LoaderError::InvalidConfig(
                "Poll interval must be > 0 ms".into(),
            ));
        }
        if c.ocr_timeout_secs == 0 || c.http_timeout_secs == 0 {
            return Err(LoaderError::InvalidConfig(
                "Timeouts must be > 0 s".into(),
            ));
        }
        if c.ocr_model.trim().is_empty() {
            return Err(LoaderError::InvalidConfig(
                "OCR model identifier must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(LoaderError::InvalidConfig(
                "Upload limit must be > 0 bytes".into(),
            ));
        }
        Ok(self.config)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Page-boundary marker written before each page's text.
///
/// The number is the page's position among the pages that were actually
/// OCR'd, not its position in the uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMarker {
    /// `--- Page N ---` (default)
    #[default]
    Banner,
    /// `<!-- page N -->`
    Comment,
}

impl PageMarker {
    /// Render the marker line for the given ordinal (1-indexed).
    pub fn render(&self, ordinal: usize) -> String {
        match self {
            PageMarker::Banner => format!("--- Page {} ---", ordinal),
            PageMarker::Comment => format!("<!-- page {} -->", ordinal),
        }
    }
}
