//! Page classification: is a page worth OCR'ing, and which way is it facing.
//!
//! Both checks are pure functions over [`PageFacts`] / [`PageGeometry`] so
//! the backend only has to gather facts once per page.
//!
//! The empty check is conservative. Any embedded image or form
//! object counts as content, even a 0×0 one, so a scanned page is never
//! dropped because its text layer is empty.

use super::page::{PageFacts, PageGeometry};

/// True iff the page has no non-whitespace text AND no embedded object.
///
/// A failed probe (`None`) is not proof of content.
pub fn is_empty(page: &PageFacts) -> bool {
    let has_text = page
        .text
        .as_deref()
        .is_some_and(|text| !text.trim().is_empty());
    let has_object = page.has_embedded_object.unwrap_or(false);

    !has_text && !has_object
}

/// True iff the page is wider than tall once `/Rotate` is applied.
pub fn is_landscape(geometry: &PageGeometry) -> bool {
    let (width, height) = geometry.effective_size();
    width > height
}
