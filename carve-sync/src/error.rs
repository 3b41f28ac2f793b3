//! Error types for carve-sync.

use std::path::PathBuf;

use thiserror::Error;

use carve_core::types::{CategoryKind, ManifestEntry};
use carve_core::ManifestError;
use carve_renderer::RenderError;

/// All errors that can arise from sync, amalgamation, status and diff.
///
/// Every variant is fatal for the run: nothing is retried or skipped.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A manifest entry has no file upstream.
    #[error("missing source for {category} entry '{entry}': {path} does not exist")]
    MissingSource {
        category: CategoryKind,
        entry: ManifestEntry,
        path: PathBuf,
    },

    /// An I/O error (read, create, write or rename), with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The amalgamator ran before an entry it needs was synchronized.
    #[error("cannot amalgamate: sources entry '{entry}' is not present at {path}; sync sources first")]
    Precondition { entry: ManifestEntry, path: PathBuf },

    /// The manifest handed to the pipeline failed validation.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
