//! Page splitting: one multi-page upload → ordered single-page units.
//!
//! Walks pages in ascending original order, drops empty ones, gives
//! landscape pages an extra quarter turn, and cuts each survivor into its own
//! PDF. The original page index rides along on every [`PageUnit`] because
//! once pages are skipped, a unit's position no longer says where it came
//! from.

use super::classify;
use super::page::{PageUnit, SourceDocument};
use crate::error::LoaderError;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// A PDF backend able to split an uploaded file into page units.
///
/// Implementations parse `source`, then hand the parsed document to
/// [`split`] so skip/rotate/order rules stay in one place.
#[async_trait]
pub trait DocumentSplitter: Send + Sync {
    /// Split the PDF at `source` into ordered single-page units.
    ///
    /// Unparseable input must fail with [`LoaderError::MalformedDocument`].
    async fn split_file(&self, source: &Path) -> Result<Vec<PageUnit>, LoaderError>;
}

/// Split a parsed document into OCR-ready single-page units.
///
/// Output order equals ascending `original_index`. A document with no pages,
/// or only empty pages, yields an empty vector. Any structural failure aborts
/// the whole split; no partial output is returned.
pub fn split<D: SourceDocument + ?Sized>(document: &D) -> Result<Vec<PageUnit>, LoaderError> {
    let total = document.page_count();
    let mut units = Vec::with_capacity(total);

    for original_index in 1..=total {
        let facts = document.inspect(original_index)?;

        if classify::is_empty(&facts) {
            debug!(original_page = original_index, "Skipping empty page");
            continue;
        }

        let landscape = classify::is_landscape(&facts.geometry);
        let rotation = if landscape {
            facts.geometry.rotation.quarter_turn()
        } else {
            facts.geometry.rotation
        };
        if landscape {
            debug!(
                original_page = original_index,
                from = facts.geometry.rotation.degrees(),
                to = rotation.degrees(),
                "Rotating landscape page to portrait"
            );
        }

        let bytes = document.extract(original_index, rotation)?;
        units.push(PageUnit {
            original_index,
            rotation,
            rotated: landscape,
            bytes,
        });
    }

    info!(
        "Split {} pages into {} units ({} empty skipped)",
        total,
        units.len(),
        total - units.len()
    );
    Ok(units)
}
