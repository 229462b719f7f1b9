//! Per-request scratch space.
//!
//! pdfium opens documents from a path, so the upload and every page unit are
//! written to disk. Each request gets its own `request-*` directory under the
//! configured root; two requests never share a file.
//!
//! Release is layered: unit files are discarded as soon as their OCR call
//! returns, [`Workspace::release`] removes the directory on the normal path,
//! and dropping a [`Workspace`] (early return, panic, cancelled future)
//! removes it through [`TempDir`]'s destructor.

use super::page::PageUnit;
use crate::error::LoaderError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Scoped scratch directory owned by one request.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh request directory under `root`, creating `root` first
    /// if it does not exist yet.
    pub async fn create(root: &Path) -> Result<Self, LoaderError> {
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| LoaderError::resource(root, e))?;

        let parent = root.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix("request-").tempdir_in(parent)
        })
        .await
        .map_err(|e| LoaderError::Internal(format!("workspace task failed: {e}")))?
        .map_err(|e| LoaderError::resource(root, e))?;
        debug!("Workspace created at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the uploaded document to `source.pdf`.
    pub async fn persist_source(&self, bytes: &[u8]) -> Result<PathBuf, LoaderError> {
        self.write("source.pdf", bytes).await
    }

    /// Write one page unit to `page-NNNN.pdf`, named by its original index.
    pub async fn persist_unit(&self, unit: &PageUnit) -> Result<PathBuf, LoaderError> {
        self.write(&format!("page-{:04}.pdf", unit.original_index), &unit.bytes)
            .await
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, LoaderError> {
        let path = self.dir.path().join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| LoaderError::resource(&path, e))?;
        Ok(path)
    }

    /// Remove the whole request directory and report whether that worked.
    /// The recursive removal runs on the blocking pool.
    pub async fn release(self) -> Result<(), LoaderError> {
        let path = self.dir.path().to_path_buf();
        let dir = self.dir;
        tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(|e| LoaderError::Internal(format!("workspace task failed: {e}")))?
            .map_err(|e| LoaderError::resource(path, e))
    }
}

/// Remove one workspace file early. Best effort: the directory sweep in
/// [`Workspace::release`] catches anything left behind.
pub async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Could not remove {}: {}", path.display(), e);
    }
}
