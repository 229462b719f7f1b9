//! Azure Document Intelligence OCR backend.
//!
//! Drives the asynchronous REST flow of the `prebuilt-read` model:
//!
//! ```text
//! POST {endpoint}/documentintelligence/documentModels/{model}:analyze?api-version=…
//!   → 202 Accepted, Operation-Location: <poll url>
//! GET  <poll url>   (repeat until status is succeeded / failed)
//!   → { "status": "succeeded", "analyzeResult": { "pages": [ { "lines": [...] } ] } }
//! ```
//!
//! The whole submit-and-poll cycle is one `recognize` call from the
//! pipeline's point of view. Every non-success outcome, including a poll
//! deadline, surfaces as [`LoaderError::ServiceError`].

use super::ocr::{OcrEngine, OcrResult};
use crate::config::{ServiceConfig, ENGINE_ID};
use crate::error::LoaderError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "operation-location";

/// OCR engine backed by an Azure Document Intelligence resource.
pub struct AzureOcr {
    client: reqwest::Client,
    endpoint: Option<String>,
    key: Option<String>,
    model: String,
    api_version: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl AzureOcr {
    /// Build the engine. Missing credentials are allowed here; they make
    /// every call fail with [`LoaderError::Unconfigured`] instead.
    pub fn new(config: &ServiceConfig) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| LoaderError::Internal(format!("HTTP client: {}", e)))?;

        if !config.ocr_configured() {
            warn!(
                "OCR service not configured (missing: {}); /process will fail until it is",
                config.missing_ocr_settings().unwrap_or_default()
            );
        }

        Ok(Self {
            client,
            endpoint: config.ocr_endpoint.clone(),
            key: config.ocr_key.clone(),
            model: config.ocr_model.clone(),
            api_version: config.ocr_api_version.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout: Duration::from_secs(config.ocr_timeout_secs),
        })
    }

    fn credentials(&self) -> Result<(&str, &str), LoaderError> {
        match (self.endpoint.as_deref(), self.key.as_deref()) {
            (Some(endpoint), Some(key)) => Ok((endpoint, key)),
            (endpoint, key) => {
                let mut missing = Vec::new();
                if endpoint.is_none() {
                    missing.push("endpoint");
                }
                if key.is_none() {
                    missing.push("key");
                }
                Err(LoaderError::Unconfigured {
                    missing: missing.join(", "),
                })
            }
        }
    }

    fn analyze_url(&self, endpoint: &str) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            endpoint.trim_end_matches('/'),
            self.model,
            self.api_version
        )
    }
}

#[async_trait]
impl OcrEngine for AzureOcr {
    fn engine_id(&self) -> &str {
        ENGINE_ID
    }

    fn ensure_configured(&self) -> Result<(), LoaderError> {
        self.credentials().map(|_| ())
    }

    async fn recognize(&self, page_pdf: &[u8]) -> Result<OcrResult, LoaderError> {
        let (endpoint, key) = self.credentials()?;
        let deadline = Instant::now() + self.timeout;

        let response = self
            .client
            .post(self.analyze_url(endpoint))
            .header(KEY_HEADER, key)
            .header(CONTENT_TYPE, "application/pdf")
            .body(page_pdf.to_vec())
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(rejected(response).await);
        }

        let operation = response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| service_error("analyze response carried no Operation-Location header"))?;
        let mut wait = retry_after(response.headers()).unwrap_or(self.poll_interval);
        debug!("Analyze accepted, polling {}", operation);

        loop {
            if Instant::now() + wait > deadline {
                return Err(service_error(format!(
                    "analyze did not finish within {}s",
                    self.timeout.as_secs()
                )));
            }
            sleep(wait).await;

            let response = self
                .client
                .get(&operation)
                .header(KEY_HEADER, key)
                .send()
                .await
                .map_err(transport_error)?;

            if !response.status().is_success() {
                return Err(rejected(response).await);
            }

            let next_wait = retry_after(response.headers());
            let operation_state: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| service_error(format!("unreadable analyze result: {}", e)))?;

            match operation_state.status {
                OperationStatus::Succeeded => {
                    let result = operation_state.analyze_result.unwrap_or_default();
                    return Ok(OcrResult::new(result.into_lines()));
                }
                OperationStatus::Failed | OperationStatus::Canceled => {
                    let detail = operation_state
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "analyze operation failed".to_string());
                    return Err(service_error(detail));
                }
                OperationStatus::NotStarted | OperationStatus::Running => {
                    wait = next_wait.unwrap_or(self.poll_interval);
                }
            }
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: OperationStatus,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceErrorBody>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<AnalyzedPage>,
}

impl AnalyzeResult {
    /// Lines of every returned page, in page then reading order.
    fn into_lines(mut self) -> Vec<String> {
        self.pages.sort_by_key(|p| p.page_number);
        self.pages
            .into_iter()
            .flat_map(|page| page.lines.into_iter().map(|line| line.content))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzedPage {
    #[serde(default)]
    page_number: usize,
    #[serde(default)]
    lines: Vec<AnalyzedLine>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedLine {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServiceErrorBody,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl std::fmt::Display for ServiceErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.code, self.message),
            (false, true) => write!(f, "{}", self.code),
            _ => write!(f, "{}", self.message),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn service_error(detail: impl Into<String>) -> LoaderError {
    LoaderError::ServiceError {
        page: None,
        detail: detail.into(),
    }
}

fn transport_error(e: reqwest::Error) -> LoaderError {
    if e.is_timeout() {
        service_error(format!("request timed out: {}", e))
    } else {
        service_error(format!("request failed: {}", e))
    }
}

/// Turn a non-success response into a service error, keeping Azure's
/// error code and message when the body has them.
async fn rejected(response: reqwest::Response) -> LoaderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    service_error(describe_rejection(status, &body))
}

fn describe_rejection(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("HTTP {} ({})", status, envelope.error),
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
