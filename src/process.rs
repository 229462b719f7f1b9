//! Request orchestration: bytes in, transcript out, scratch space gone.
//!
//! ## Fail-fast, then clean
//!
//! Every stage failure aborts the request and no partial transcript is ever
//! built. Cleanup runs after the outcome is known and cannot change it: a
//! directory that refuses to go away is logged, counted in
//! [`Pipeline::cleanup_failures`], and otherwise ignored.
//!
//! ## Ordering under concurrency
//!
//! OCR calls go through `buffered(concurrency)`, which yields results in
//! submission order whatever order the calls finish in. With the default
//! concurrency of 1 the calls are strictly sequential.

use crate::config::ServiceConfig;
use crate::error::LoaderError;
use crate::output::ProcessOutput;
use crate::pipeline::aggregate::{aggregate, Transcript};
use crate::pipeline::input::Upload;
use crate::pipeline::ocr::{recognize_unit, OcrEngine, RecognizedPage};
use crate::pipeline::split::DocumentSplitter;
use crate::pipeline::workspace::{self, Workspace};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The split → OCR → aggregate pipeline, shared by every request.
///
/// Holds no per-request state: each call to [`Pipeline::process`] gets its
/// own [`Workspace`].
pub struct Pipeline {
    config: ServiceConfig,
    splitter: Arc<dyn DocumentSplitter>,
    ocr: Arc<dyn OcrEngine>,
    cleanup_failures: AtomicU64,
}

impl Pipeline {
    pub fn new(
        config: ServiceConfig,
        splitter: Arc<dyn DocumentSplitter>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            config,
            splitter,
            ocr,
            cleanup_failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Whether the OCR engine can make calls at all.
    pub fn ocr_configured(&self) -> bool {
        self.ocr.ensure_configured().is_ok()
    }

    /// Scratch directories that could not be removed since start-up.
    pub fn cleanup_failures(&self) -> u64 {
        self.cleanup_failures.load(Ordering::Relaxed)
    }

    /// Validate an upload, run it through [`Pipeline::process`] and wrap the
    /// transcript with its response metadata.
    pub async fn process_upload(&self, upload: Upload) -> Result<ProcessOutput, LoaderError> {
        upload.validate()?;
        info!(
            filename = upload.filename(),
            bytes = upload.bytes.len(),
            "Processing upload"
        );
        let transcript = self.process(&upload.bytes).await?;
        Ok(ProcessOutput::new(&upload, transcript, self.ocr.engine_id()))
    }

    /// Turn the raw bytes of a PDF into its transcript.
    ///
    /// # Errors
    /// - [`LoaderError::Unconfigured`] before any work if the OCR engine
    ///   has no credentials
    /// - [`LoaderError::MalformedDocument`] if the bytes do not parse
    /// - [`LoaderError::ServiceError`] on the first page the OCR engine fails
    /// - [`LoaderError::ResourceError`] if scratch files cannot be written
    pub async fn process(&self, document: &[u8]) -> Result<Transcript, LoaderError> {
        let start = Instant::now();
        self.ocr.ensure_configured()?;

        let workspace = Workspace::create(&self.config.temp_root).await?;
        let outcome = self.run(&workspace, document).await;

        let scratch = workspace.path().to_path_buf();
        match workspace.release().await {
            Ok(()) => debug!("Workspace {} removed", scratch.display()),
            Err(e) => {
                self.cleanup_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Cleanup failed: {}", e);
            }
        }

        match &outcome {
            Ok(transcript) => info!(
                pages = transcript.page_count(),
                "Transcript ready in {}ms",
                start.elapsed().as_millis()
            ),
            Err(e) => warn!(category = e.category(), "Processing failed: {}", e),
        }
        outcome
    }

    async fn run(&self, workspace: &Workspace, document: &[u8]) -> Result<Transcript, LoaderError> {
        // ── Step 1: Persist upload ───────────────────────────────────────────
        let source = workspace.persist_source(document).await?;

        // ── Step 2: Split into page units ────────────────────────────────────
        let units = self.splitter.split_file(&source).await?;
        workspace::discard(&source).await;

        // ── Step 3: Materialize each unit ────────────────────────────────────
        let mut materialized = Vec::with_capacity(units.len());
        for unit in units {
            let path = workspace.persist_unit(&unit).await?;
            materialized.push((unit.original_index, path));
        }

        // ── Step 4: OCR, in order, first failure wins ────────────────────────
        let total = materialized.len();
        let pages: Vec<RecognizedPage> =
            stream::iter(materialized.into_iter().enumerate().map(
                |(position, (original_index, path))| {
                    let ocr = Arc::clone(&self.ocr);
                    async move {
                        debug!(
                            ordinal = position + 1,
                            original_page = original_index,
                            "OCR page {}/{}",
                            position + 1,
                            total
                        );
                        let page = recognize_unit(ocr.as_ref(), &path, original_index).await;
                        workspace::discard(&path).await;
                        page
                    }
                },
            ))
            .buffered(self.config.concurrency)
            .try_collect()
            .await?;

        // ── Step 5: Aggregate ────────────────────────────────────────────────
        Ok(aggregate(&pages, self.config.page_marker))
    }
}
