//! # doculoader
//!
//! A PDF OCR gateway: upload a PDF, get back one ordered plain-text
//! transcript of every page that has something on it.
//!
//! ## Why split first?
//!
//! OCR services read a page best when it is upright and on its own. So the
//! upload is cut into single-page PDFs, pages with neither text nor images
//! are dropped, landscape pages get a quarter turn, and each surviving page
//! is sent to the OCR engine separately. The results come back together as
//! one transcript with a marker before each page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Validate   empty body, `.pdf` filename, content type
//!  ├─ 2. Workspace  per-request temp dir (removed on every exit path)
//!  ├─ 3. Split      pdfium: skip empty pages, rotate landscape (spawn_blocking)
//!  ├─ 4. OCR        Azure Document Intelligence `prebuilt-read`, page by page
//!  └─ 5. Aggregate  `--- Page N ---` markers, N counts surviving pages
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doculoader::{AzureOcr, Pipeline, PdfiumSplitter, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder()
//!         .ocr_endpoint("https://example.cognitiveservices.azure.com")
//!         .ocr_key("secret")
//!         .build()?;
//!     let splitter = Arc::new(PdfiumSplitter::bind(&config)?);
//!     let ocr = Arc::new(AzureOcr::new(&config)?);
//!     let pipeline = Pipeline::new(config, splitter, ocr);
//!
//!     let transcript = pipeline.process(&std::fs::read("scan.pdf")?).await?;
//!     println!("{}", transcript);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doculoader` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageMarker, ServiceConfig, ServiceConfigBuilder, ENGINE_ID};
pub use error::LoaderError;
pub use output::{OutputMetadata, ProcessOutput};
pub use pipeline::aggregate::{aggregate, Transcript};
pub use pipeline::azure::AzureOcr;
pub use pipeline::input::Upload;
pub use pipeline::ocr::{OcrEngine, OcrResult, RecognizedPage};
pub use pipeline::page::{PageFacts, PageGeometry, PageUnit, Rotation, SourceDocument};
pub use pipeline::pdfium::PdfiumSplitter;
pub use pipeline::split::{split, DocumentSplitter};
pub use process::Pipeline;
pub use server::{router, serve};
