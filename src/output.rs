//! Response types returned by [`crate::Pipeline::process_upload`].

use crate::pipeline::aggregate::Transcript;
use crate::pipeline::input::Upload;
use serde::Serialize;

/// The transcript plus pass-through metadata, serialized as the
/// `PUT /process` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    /// The full transcript, page markers included.
    pub page_content: String,
    pub metadata: OutputMetadata,
}

/// Metadata echoed back alongside the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputMetadata {
    pub filename: String,
    pub content_type: String,
    /// Constant identifier of the OCR engine.
    pub engine: String,
    /// Number of pages that made it into the transcript.
    pub pages: usize,
}

impl ProcessOutput {
    pub fn new(upload: &Upload, transcript: Transcript, engine: &str) -> Self {
        let pages = transcript.page_count();
        Self {
            page_content: transcript.into_string(),
            metadata: OutputMetadata {
                filename: upload.filename().to_string(),
                content_type: upload.content_type().to_string(),
                engine: engine.to_string(),
                pages,
            },
        }
    }
}
