//! OCR seam: the trait every OCR backend implements, plus the per-page call.
//!
//! The pipeline only knows "bytes of a one-page PDF in, ordered lines out".
//! Everything about how the remote service is driven (submit, poll, parse)
//! lives behind [`OcrEngine`], so ordering and aggregation can be tested with
//! a deterministic stand-in.
//!
//! ## No retries here
//!
//! A page failure aborts the request. The caller resubmits the document if
//! it wants another attempt; the core never re-issues a page on its own.

use crate::error::LoaderError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Ordered recognized lines for one page unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrResult {
    pub lines: Vec<String>,
}

impl OcrResult {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

/// An OCR recognized page, still tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedPage {
    /// 1-based position of the source page in the uploaded document.
    pub original_index: usize,
    pub result: OcrResult,
}

/// An external OCR capability.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Identifier echoed in response metadata, e.g. `azure-document-intelligence`.
    fn engine_id(&self) -> &str;

    /// Fail fast with [`LoaderError::Unconfigured`] when the engine cannot
    /// make calls at all. Checked once per request, before any work.
    fn ensure_configured(&self) -> Result<(), LoaderError> {
        Ok(())
    }

    /// Recognize the text of one single-page PDF.
    async fn recognize(&self, page_pdf: &[u8]) -> Result<OcrResult, LoaderError>;
}

/// OCR one materialized page unit.
///
/// Reads the unit back from its scratch file so the engine sees exactly
/// what was written to disk. Service errors are tagged with the original
/// page index.
pub async fn recognize_unit(
    engine: &dyn OcrEngine,
    unit_path: &Path,
    original_index: usize,
) -> Result<RecognizedPage, LoaderError> {
    let start = Instant::now();
    let bytes = tokio::fs::read(unit_path)
        .await
        .map_err(|e| LoaderError::resource(unit_path, e))?;

    let result = engine
        .recognize(&bytes)
        .await
        .map_err(|e| e.on_page(original_index))?;

    debug!(
        original_page = original_index,
        lines = result.lines.len(),
        "Page recognized in {:?}",
        start.elapsed()
    );

    Ok(RecognizedPage {
        original_index,
        result,
    })
}
