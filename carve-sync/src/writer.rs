//! Content-gated atomic copier, applied per manifest entry.
//!
//! ## `sync_entry` protocol
//!
//! 1. Stat the upstream file; absent → [`SyncError::MissingSource`], nothing
//!    is created for the entry.
//! 2. Compare destination and source byte for byte (length first, then
//!    chunked content). Timestamps are never consulted.
//! 3. Identical → [`WriteResult::Unchanged`], no write of any kind.
//! 4. Otherwise create missing parent directories and copy the source to
//!    `<dest>.carve.tmp`.
//! 5. Rename the temp file over the destination (atomic on POSIX). On
//!    failure the temp file is removed and the old destination is left as is.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use carve_core::types::{Category, CategoryKind, ManifestEntry};

use crate::error::{io_err, SyncError};

const TMP_SUFFIX: &str = ".carve.tmp";

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; destination already matches byte for byte.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    /// `true` for `Written` and `WouldWrite`.
    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

// ---------------------------------------------------------------------------
// sync_entry
// ---------------------------------------------------------------------------

/// Synchronize one manifest entry of `category`.
pub fn sync_entry(
    category: &Category,
    entry: &ManifestEntry,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let source = category.source_path(entry);
    let destination = category.destination_path(entry);

    ensure_source(category.kind, entry, &source)?;

    if files_identical(&source, &destination)? {
        tracing::debug!("unchanged: {}", destination.display());
        return Ok(WriteResult::Unchanged { path: destination });
    }

    if dry_run {
        tracing::info!("[dry-run] would copy: {}", destination.display());
        return Ok(WriteResult::WouldWrite { path: destination });
    }

    copy_atomic(&source, &destination)?;
    tracing::info!("copied: {} -> {}", source.display(), destination.display());
    Ok(WriteResult::Written { path: destination })
}

/// Outcome of synchronizing a single category.
#[derive(Debug)]
pub struct SyncCategoryResult {
    pub kind: CategoryKind,
    pub writes: Vec<(ManifestEntry, WriteResult)>,
}

impl SyncCategoryResult {
    pub fn written(&self) -> usize {
        self.writes.iter().filter(|(_, w)| w.is_change()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.writes.len() - self.written()
    }
}

/// Synchronize every entry of `category` in manifest order.
///
/// `on_entry` is called after each entry, before the next one starts, so
/// progress is visible even when a later entry aborts the run.
pub fn sync_category(
    category: &Category,
    dry_run: bool,
    on_entry: &mut dyn FnMut(&ManifestEntry, &WriteResult),
) -> Result<SyncCategoryResult, SyncError> {
    let mut writes = Vec::with_capacity(category.entries.len());
    for entry in &category.entries {
        let result = sync_entry(category, entry, dry_run)?;
        on_entry(entry, &result);
        writes.push((entry.clone(), result));
    }
    Ok(SyncCategoryResult {
        kind: category.kind,
        writes,
    })
}

// ---------------------------------------------------------------------------
// Byte-identity check
// ---------------------------------------------------------------------------

/// `true` when `destination` exists and has exactly the bytes of `source`.
pub fn files_identical(source: &Path, destination: &Path) -> Result<bool, SyncError> {
    let dest_meta = match std::fs::metadata(destination) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(io_err(destination, err)),
    };
    if !dest_meta.is_file() {
        return Ok(false);
    }
    let source_meta = std::fs::metadata(source).map_err(|e| io_err(source, e))?;
    if source_meta.len() != dest_meta.len() {
        return Ok(false);
    }

    let mut a = BufReader::new(File::open(source).map_err(|e| io_err(source, e))?);
    let mut b = BufReader::new(File::open(destination).map_err(|e| io_err(destination, e))?);
    loop {
        let chunk_a = a.fill_buf().map_err(|e| io_err(source, e))?;
        let chunk_b = b.fill_buf().map_err(|e| io_err(destination, e))?;
        if chunk_a.is_empty() || chunk_b.is_empty() {
            return Ok(chunk_a.is_empty() && chunk_b.is_empty());
        }
        let n = chunk_a.len().min(chunk_b.len());
        if chunk_a[..n] != chunk_b[..n] {
            return Ok(false);
        }
        a.consume(n);
        b.consume(n);
    }
}

// ---------------------------------------------------------------------------
// Atomic writes
// ---------------------------------------------------------------------------

/// `<path>.carve.tmp`, in the same directory as `path`.
pub(crate) fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().unwrap_or_default().to_os_string();
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

/// Copy `source` over `destination` through a sibling temp file.
pub(crate) fn copy_atomic(source: &Path, destination: &Path) -> Result<(), SyncError> {
    create_parent(destination)?;
    let tmp = tmp_path_for(destination);
    if let Err(e) = std::fs::copy(source, &tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(source, e));
    }
    commit(&tmp, destination)
}

/// Write `content` to `path` through a sibling temp file.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SyncError> {
    write_atomic_with_tmp(path, content, &tmp_path_for(path))
}

fn write_atomic_with_tmp(path: &Path, content: &[u8], tmp: &Path) -> Result<(), SyncError> {
    create_parent(path)?;
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    commit(tmp, path)
}

fn commit(tmp: &Path, path: &Path) -> Result<(), SyncError> {
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn create_parent(path: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    Ok(())
}

fn ensure_source(kind: CategoryKind, entry: &ManifestEntry, source: &Path) -> Result<(), SyncError> {
    match std::fs::metadata(source) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(SyncError::MissingSource {
            category: kind,
            entry: entry.clone(),
            path: source.to_path_buf(),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(SyncError::MissingSource {
            category: kind,
            entry: entry.clone(),
            path: source.to_path_buf(),
        }),
        Err(err) => Err(io_err(source, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
