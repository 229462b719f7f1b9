//! Shared stand-ins for the PDF parser and the OCR service.
//!
//! `FakeSplitter` parses nothing: it checks the `%PDF` magic of the persisted
//! upload, then feeds a scripted page list through the real `split` so the
//! skip/rotate/order rules under test are the production ones. Each unit's
//! bytes are a header line (`#unit <original> <degrees>`) followed by the
//! page's text, which `ScriptedOcr` hands back as recognized lines.

#![allow(dead_code)]

use async_trait::async_trait;
use doculoader::{
    split, DocumentSplitter, LoaderError, OcrEngine, OcrResult, PageFacts, PageGeometry,
    PageUnit, Pipeline, Rotation, ServiceConfig, SourceDocument,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PDF: &[u8] = b"%PDF-1.7\n% test upload\n";

// ── Pages ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakePage {
    width: f32,
    height: f32,
    rotation: Rotation,
    lines: Vec<String>,
    image: bool,
}

impl FakePage {
    pub fn text(lines: &[&str]) -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            rotation: Rotation::Deg0,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            image: false,
        }
    }

    pub fn blank() -> Self {
        Self::text(&[])
    }

    /// A scanned page: no text layer, one image.
    pub fn scanned(lines: &[&str]) -> Self {
        Self {
            image: true,
            ..Self::text(lines)
        }
    }

    pub fn landscape(mut self) -> Self {
        std::mem::swap(&mut self.width, &mut self.height);
        self
    }

    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

struct FakeDocument<'a> {
    pages: &'a [FakePage],
}

impl SourceDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn inspect(&self, original_index: usize) -> Result<PageFacts, LoaderError> {
        let page = &self.pages[original_index - 1];
        let text = if page.image {
            String::new()
        } else {
            page.lines.join("\n")
        };
        Ok(PageFacts {
            original_index,
            geometry: PageGeometry::new(page.width, page.height, page.rotation),
            text: Some(text),
            has_embedded_object: Some(page.image),
        })
    }

    fn extract(&self, original_index: usize, rotation: Rotation) -> Result<Vec<u8>, LoaderError> {
        let page = &self.pages[original_index - 1];
        let mut bytes = format!("#unit {} {}\n", original_index, rotation.degrees());
        bytes.push_str(&page.lines.join("\n"));
        Ok(bytes.into_bytes())
    }
}

// ── Splitter ─────────────────────────────────────────────────────────────────

pub struct FakeSplitter {
    pages: Vec<FakePage>,
}

impl FakeSplitter {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl DocumentSplitter for FakeSplitter {
    async fn split_file(&self, source: &Path) -> Result<Vec<PageUnit>, LoaderError> {
        let bytes = std::fs::read(source).map_err(|e| LoaderError::ResourceError {
            path: source.to_path_buf(),
            source: e,
        })?;
        if !bytes.starts_with(b"%PDF") {
            return Err(LoaderError::MalformedDocument {
                detail: "missing %PDF header".into(),
            });
        }
        split(&FakeDocument { pages: &self.pages })
    }
}

// ── OCR ──────────────────────────────────────────────────────────────────────

/// OCR stand-in that echoes each unit's text and records what it saw.
#[derive(Default)]
pub struct ScriptedOcr {
    configured: bool,
    fail_on: Option<usize>,
    delays: HashMap<usize, u64>,
    wipe_root: Option<PathBuf>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedOcr {
    pub fn new() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Fail the unit cut from this original page.
    pub fn failing_on(mut self, original_index: usize) -> Self {
        self.fail_on = Some(original_index);
        self
    }

    pub fn with_delay(mut self, original_index: usize, ms: u64) -> Self {
        self.delays.insert(original_index, ms);
        self
    }

    /// Empty `root` during the first call, so the request directory is gone
    /// before cleanup runs.
    pub fn wiping(mut self, root: &Path) -> Self {
        self.wipe_root = Some(root.to_path_buf());
        self
    }

    /// `"<original>@<degrees>"` for every call, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    fn engine_id(&self) -> &str {
        "scripted"
    }

    fn ensure_configured(&self) -> Result<(), LoaderError> {
        if self.configured {
            Ok(())
        } else {
            Err(LoaderError::Unconfigured {
                missing: "endpoint, key".into(),
            })
        }
    }

    async fn recognize(&self, page_pdf: &[u8]) -> Result<OcrResult, LoaderError> {
        let text = String::from_utf8_lossy(page_pdf).into_owned();
        let mut lines = text.lines();
        let header = lines.next().unwrap_or_default();
        let mut fields = header.trim_start_matches("#unit ").split(' ');
        let original: usize = fields.next().unwrap_or("0").parse().unwrap_or(0);
        let degrees = fields.next().unwrap_or("0");
        self.calls
            .lock()
            .unwrap()
            .push(format!("{original}@{degrees}"));

        if let Some(ms) = self.delays.get(&original) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if let Some(root) = &self.wipe_root {
            for entry in std::fs::read_dir(root).unwrap() {
                let _ = std::fs::remove_dir_all(entry.unwrap().path());
            }
        }
        if self.fail_on == Some(original) {
            return Err(LoaderError::ServiceError {
                page: None,
                detail: "InvalidRequest: scripted failure".into(),
            });
        }

        Ok(OcrResult::new(lines.map(str::to_string).collect()))
    }
}

// ── Wiring ───────────────────────────────────────────────────────────────────

pub fn config(root: &Path) -> ServiceConfig {
    ServiceConfig::builder().temp_root(root).build().unwrap()
}

pub fn pipeline_with(
    config: ServiceConfig,
    pages: Vec<FakePage>,
    ocr: Arc<ScriptedOcr>,
) -> Pipeline {
    Pipeline::new(config, Arc::new(FakeSplitter::new(pages)), ocr)
}

/// Number of entries directly under `root` (0 if it does not exist).
pub fn leftovers(root: &Path) -> usize {
    std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
}
