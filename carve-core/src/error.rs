//! Error types for carve-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{CategoryKind, ManifestEntry};

/// All errors that can arise from loading, validating, or saving a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure, with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with file path and serde_yaml line context.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// An entry that cannot be mirrored safely below its category root.
    #[error("invalid {category} entry '{entry}': {reason}")]
    InvalidEntry {
        category: CategoryKind,
        entry: ManifestEntry,
        reason: &'static str,
    },

    #[error("invalid amalgamation settings: {reason}")]
    InvalidAmalgamation { reason: String },

    /// A vendored file would be overwritten by the generated aggregate.
    #[error("{category} entry '{entry}' resolves to the amalgamation output path")]
    AggregateCollision {
        category: CategoryKind,
        entry: ManifestEntry,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
