//! Manifest files: the built-in default, discovery, load and atomic save.
//!
//! # File format
//!
//! ```yaml
//! amalgamation:
//!   output: Support.cpp
//!   undef_macro: DEBUG_TYPE
//!   fragment_suffixes: [".inc"]
//! headers:
//!   source: llvm/include
//!   destination: include
//!   files: [llvm/ADT/ArrayRef.h]
//! sources:
//!   source: llvm/lib
//!   destination: lib
//!   files: [Support/APInt.cpp, Support/Unix/Path.inc]
//! tests:
//!   source: llvm/unittests
//!   destination: tests
//!   files: [ADT/SmallVectorTest.cpp]
//! ```
//!
//! Every function takes explicit paths (`_at` forms); nothing reads the
//! process environment.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ManifestError};
use crate::types::Manifest;

/// Name of the manifest file looked up in the working directory.
pub const MANIFEST_FILE_NAME: &str = "carve.yaml";

const DEFAULT_MANIFEST: &str = include_str!("data/default_manifest.yaml");

/// YAML source of the built-in manifest (the LLVM Support subset).
pub fn default_manifest_yaml() -> &'static str {
    DEFAULT_MANIFEST
}

/// Parse and validate the built-in manifest.
pub fn default_manifest() -> Result<Manifest, ManifestError> {
    parse(DEFAULT_MANIFEST, Path::new("<built-in>"))
}

/// Parse manifest YAML. `origin` is only used in error messages.
///
/// Duplicate entries are accepted and logged at `warn`.
pub fn parse(contents: &str, origin: &Path) -> Result<Manifest, ManifestError> {
    let manifest: Manifest = serde_yaml::from_str(contents).map_err(|e| ManifestError::Parse {
        path: origin.to_path_buf(),
        source: e,
    })?;
    manifest.validate()?;
    for (kind, entry) in manifest.duplicates() {
        tracing::warn!("{}: {kind} entry '{entry}' is listed more than once", origin.display());
    }
    Ok(manifest)
}

/// Load a manifest from `path`.
///
/// Returns [`ManifestError::NotFound`] if absent and
/// [`ManifestError::Parse`] (with path + line context) if malformed.
pub fn load_at(path: &Path) -> Result<Manifest, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse(&contents, path)
}

/// `<dir>/carve.yaml` if it exists.
pub fn discover_at(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(MANIFEST_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Atomically save `manifest` to `path`.
///
/// Write flow: validate → serialize → `<name>.tmp` sibling → `rename`.
pub fn save_at(path: &Path, manifest: &Manifest) -> Result<(), ManifestError> {
    manifest.validate()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let yaml = serde_yaml::to_string(manifest)?;
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
