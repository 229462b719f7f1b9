//! Pipeline stages for PDF-to-transcript processing.
//!
//! Each submodule implements one step. PDF parsing and OCR sit behind
//! traits ([`split::DocumentSplitter`], [`ocr::OcrEngine`]) so ordering,
//! skipping and cleanup can be tested without pdfium or a network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ workspace ──▶ split ──▶ ocr ──▶ aggregate
//! (checks)   (temp dir)    (pdfium)  (Azure)  (markers)
//! ```
//!
//! 1. [`input`]: reject empty bodies and non-PDF uploads
//! 2. [`workspace`]: per-request scratch directory, removed on every exit
//! 3. [`split`]: skip empty pages ([`classify`]), turn landscape pages
//!    upright, cut one PDF per page; [`pdfium`] supplies the parser and runs
//!    it in `spawn_blocking`
//! 4. [`ocr`]: one call per page unit; [`azure`] is the production engine
//! 5. [`aggregate`]: ordered transcript with surviving-sequence markers

pub mod aggregate;
pub mod azure;
pub mod classify;
pub mod input;
pub mod ocr;
pub mod page;
pub mod pdfium;
pub mod split;
pub mod workspace;
