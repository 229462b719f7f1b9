//! PDFium-backed [`DocumentSplitter`].
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is
//! CPU-bound and not async-aware. Splitting runs on the blocking pool so
//! Tokio worker threads keep serving other requests.
//!
//! ## Why bind per split?
//!
//! A bound [`Pdfium`] owns `Box<dyn PdfiumLibraryBindings>`, which is neither
//! `Send` nor `Sync`, so it cannot be shared between requests or moved onto
//! the blocking pool. [`PdfiumSplitter`] keeps only the library location and
//! binds inside each blocking task. [`PdfiumSplitter::bind`] binds once at
//! start-up so a missing library fails the process, not the first request.
//!
//! ## Declared vs. displayed size
//!
//! pdfium's `FPDF_GetPageWidthF` already applies `/Rotate`. The classifier
//! wants the *declared* media box, so we read it from the page boundaries and
//! only fall back to the displayed size (un-swapped) when the box is
//! inherited from the page tree and pdfium will not report it directly.

use super::page::{PageFacts, PageGeometry, PageUnit, Rotation, SourceDocument};
use super::split::{split, DocumentSplitter};
use crate::config::ServiceConfig;
use crate::error::LoaderError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Splits uploads with pdfium, bound afresh inside each blocking task.
#[derive(Debug, Clone)]
pub struct PdfiumSplitter {
    lib_path: Option<PathBuf>,
}

impl PdfiumSplitter {
    /// Check that pdfium can be bound from `config.pdfium_lib_path`, the
    /// working directory or the system library.
    pub fn bind(config: &ServiceConfig) -> Result<Self, LoaderError> {
        let lib_path = config.pdfium_lib_path.clone();
        bind_library(lib_path.as_deref())?;
        Ok(Self { lib_path })
    }
}

#[async_trait]
impl DocumentSplitter for PdfiumSplitter {
    async fn split_file(&self, source: &Path) -> Result<Vec<PageUnit>, LoaderError> {
        let lib_path = self.lib_path.clone();
        let path = source.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let pdfium = Pdfium::new(bind_library(lib_path.as_deref())?);
            let document = PdfiumDocument::open(&pdfium, &path)?;
            split(&document)
        })
        .await
        .map_err(|e| LoaderError::Internal(format!("Split task panicked: {}", e)))?
    }
}

fn bind_library(
    explicit: Option<&Path>,
) -> Result<Box<dyn PdfiumLibraryBindings>, LoaderError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = explicit {
        if path.is_dir() {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(path));
        } else {
            candidates.push(path.to_path_buf());
        }
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    for candidate in &candidates {
        match Pdfium::bind_to_library(candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(bindings);
            }
            Err(e) => debug!("pdfium not usable at {}: {:?}", candidate.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map_err(|e| LoaderError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// A pdfium document seen through the [`SourceDocument`] seam.
struct PdfiumDocument<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn open(pdfium: &'a Pdfium, path: &Path) -> Result<Self, LoaderError> {
        let document = pdfium.load_pdf_from_file(path, None).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                LoaderError::malformed("document is encrypted and requires a password")
            } else {
                LoaderError::malformed(err_str)
            }
        })?;
        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Self { pdfium, document })
    }

    fn page(&self, original_index: usize) -> Result<PdfPage<'a>, LoaderError> {
        let index = page_index(original_index)?;
        self.document.pages().get(index).map_err(|e| {
            LoaderError::malformed(format!("cannot read page {}: {:?}", original_index, e))
        })
    }
}

impl SourceDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn inspect(&self, original_index: usize) -> Result<PageFacts, LoaderError> {
        let page = self.page(original_index)?;

        let rotation = page
            .rotation()
            .map(rotation_from_pdfium)
            .map_err(|e| {
                LoaderError::malformed(format!(
                    "cannot read rotation of page {}: {:?}",
                    original_index, e
                ))
            })?;

        let (media_width, media_height) = match page.boundaries().media() {
            Ok(media) => (media.bounds.width().value, media.bounds.height().value),
            Err(_) => {
                // Inherited media box: displayed size is already rotated.
                let (w, h) = (page.width().value, page.height().value);
                if rotation.swaps_axes() {
                    (h, w)
                } else {
                    (w, h)
                }
            }
        };

        let text = match page.text() {
            Ok(text) => Some(text.all()),
            Err(e) => {
                warn!(
                    original_page = original_index,
                    "Text extraction failed: {:?}", e
                );
                None
            }
        };

        let has_embedded_object = page.objects().iter().any(|object| {
            matches!(
                object.object_type(),
                PdfPageObjectType::Image | PdfPageObjectType::XObjectForm
            )
        });

        Ok(PageFacts {
            original_index,
            geometry: PageGeometry::new(media_width, media_height, rotation),
            text,
            has_embedded_object: Some(has_embedded_object),
        })
    }

    fn extract(&self, original_index: usize, rotation: Rotation) -> Result<Vec<u8>, LoaderError> {
        let index = page_index(original_index)?;
        let extract_err = |e: PdfiumError| {
            LoaderError::malformed(format!(
                "cannot extract page {}: {:?}",
                original_index, e
            ))
        };

        let mut single = self.pdfium.create_new_pdf().map_err(extract_err)?;
        single
            .pages_mut()
            .copy_page_from_document(&self.document, index, 0)
            .map_err(extract_err)?;

        {
            let mut page = single.pages().get(0).map_err(extract_err)?;
            page.set_rotation(rotation_to_pdfium(rotation));
        }

        single.save_to_bytes().map_err(extract_err)
    }
}

fn page_index(original_index: usize) -> Result<PdfPageIndex, LoaderError> {
    original_index
        .checked_sub(1)
        .and_then(|i| PdfPageIndex::try_from(i).ok())
        .ok_or_else(|| LoaderError::malformed(format!("page {} out of range", original_index)))
}

fn rotation_from_pdfium(rotation: PdfPageRenderRotation) -> Rotation {
    match rotation {
        PdfPageRenderRotation::None => Rotation::Deg0,
        PdfPageRenderRotation::Degrees90 => Rotation::Deg90,
        PdfPageRenderRotation::Degrees180 => Rotation::Deg180,
        PdfPageRenderRotation::Degrees270 => Rotation::Deg270,
    }
}

fn rotation_to_pdfium(rotation: Rotation) -> PdfPageRenderRotation {
    match rotation {
        Rotation::Deg0 => PdfPageRenderRotation::None,
        Rotation::Deg90 => PdfPageRenderRotation::Degrees90,
        Rotation::Deg180 => PdfPageRenderRotation::Degrees180,
        Rotation::Deg270 => PdfPageRenderRotation::Degrees270,
    }
}
