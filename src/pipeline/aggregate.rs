//! Transcript assembly.
//!
//! Markers count surviving pages, not source pages: a 5-page upload whose
//! pages 2 and 4 were empty is marked 1, 2, 3. The original index is kept on
//! the [`Transcript`] for logs and metadata only.

use super::ocr::RecognizedPage;
use crate::config::PageMarker;
use std::fmt;

/// The ordered, marker-annotated text of every recognized page.
///
/// Immutable once built; [`aggregate`] is the only constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    text: String,
    source_pages: Vec<usize>,
}

impl Transcript {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Number of page blocks in the transcript.
    pub fn page_count(&self) -> usize {
        self.source_pages.len()
    }

    /// Original (1-based) page index behind each block, in block order.
    pub fn source_pages(&self) -> &[usize] {
        &self.source_pages
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Concatenate recognized pages, in the order given, into one transcript.
///
/// Each block is the marker line, the page's lines joined by `\n`, then a
/// blank separator line. No pages gives an empty transcript.
pub fn aggregate(pages: &[RecognizedPage], marker: PageMarker) -> Transcript {
    let mut text = String::new();
    let mut source_pages = Vec::with_capacity(pages.len());

    for (position, page) in pages.iter().enumerate() {
        text.push_str(&marker.render(position + 1));
        text.push('\n');
        for line in &page.result.lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push('\n');
        source_pages.push(page.original_index);
    }

    Transcript { text, source_pages }
}
