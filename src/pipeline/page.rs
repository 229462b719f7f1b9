//! Page model shared by the classifier, splitter and PDF backends.
//!
//! The pipeline never touches a PDF library directly. A backend implements
//! [`SourceDocument`] and answers two questions per page: what does it look
//! like ([`PageFacts`]) and give me this page alone as a new document. That
//! narrow seam keeps the skip/rotate/number logic testable without pdfium.

use crate::error::LoaderError;

/// Page rotation as stored in the PDF `/Rotate` entry, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Normalise any multiple of 90 (negative values included).
    /// Returns None for angles PDF does not allow.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// This rotation plus 90° clockwise.
    pub fn quarter_turn(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// True for 90° and 270°, where displayed width and height swap.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Declared page geometry: media box size in points plus `/Rotate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub media_width: f32,
    pub media_height: f32,
    pub rotation: Rotation,
}

impl PageGeometry {
    pub fn new(media_width: f32, media_height: f32, rotation: Rotation) -> Self {
        Self {
            media_width,
            media_height,
            rotation,
        }
    }

    /// Width and height as the page is displayed, after rotation.
    pub fn effective_size(&self) -> (f32, f32) {
        if self.rotation.swaps_axes() {
            (self.media_height, self.media_width)
        } else {
            (self.media_width, self.media_height)
        }
    }
}

/// What a backend could learn about one page.
///
/// Content probes are `Option`s: `None` means the probe itself failed, which
/// the classifier reads as "no evidence of content", never as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFacts {
    /// 1-based position in the uploaded document.
    pub original_index: usize,
    pub geometry: PageGeometry,
    /// Extractable text, or None if extraction failed.
    pub text: Option<String>,
    /// Whether the page holds an image or form XObject, or None if the
    /// resource inspection failed.
    pub has_embedded_object: Option<bool>,
}

/// A single-page PDF cut from the upload, ready for OCR.
#[derive(Clone, PartialEq, Eq)]
pub struct PageUnit {
    /// 1-based position of the source page in the uploaded document.
    pub original_index: usize,
    /// Rotation written into the unit's only page.
    pub rotation: Rotation,
    /// True when the splitter added a quarter turn to a landscape page.
    pub rotated: bool,
    /// Serialized single-page PDF.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PageUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageUnit")
            .field("original_index", &self.original_index)
            .field("rotation", &self.rotation)
            .field("rotated", &self.rotated)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// A parsed, multi-page source document.
///
/// Page indices passed to this trait are 1-based original indices.
pub trait SourceDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Geometry and content probes for one page.
    ///
    /// Errors here mean the page structure itself is unreadable and abort the
    /// split with [`LoaderError::MalformedDocument`].
    fn inspect(&self, original_index: usize) -> Result<PageFacts, LoaderError>;

    /// Copy one page into a new single-page document with the given rotation
    /// and return its serialized bytes.
    fn extract(&self, original_index: usize, rotation: Rotation) -> Result<Vec<u8>, LoaderError>;
}
