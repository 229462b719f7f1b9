//! Upload validation: reject requests that can never become a transcript.
//!
//! Only cheap, header-level checks happen here. Whether the bytes really
//! are a PDF is left to the parser, which reports
//! [`LoaderError::MalformedDocument`] with a useful detail.

use crate::error::LoaderError;

/// Filename assumed when the client sends none.
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// Content type assumed when the client sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/x-pdf",
    "application/octet-stream",
];

/// An uploaded document plus the metadata the client sent with it.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl Upload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Self::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Filename to report back, defaulting to `document.pdf`.
    pub fn filename(&self) -> &str {
        self.filename
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
    }

    /// Content type to report back, defaulting to `application/pdf`.
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Reject empty bodies, non-`.pdf` filenames and foreign content types.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.bytes.is_empty() {
            return Err(LoaderError::invalid_input("No file data provided"));
        }

        if !self.filename().to_ascii_lowercase().ends_with(".pdf") {
            return Err(LoaderError::invalid_input("Only PDF files are supported"));
        }

        let essence = self
            .content_type()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
            return Err(LoaderError::invalid_input(format!(
                "Unsupported content type '{}': only PDF files are supported",
                essence
            )));
        }

        Ok(())
    }
}
