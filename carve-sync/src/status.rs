//! Read-only classification of a vendored tree against upstream.
//!
//! Nothing in this module writes to disk. The same byte-identity check the
//! synchronizer uses decides whether an entry is current.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use carve_core::types::{AmalgamationSettings, Category, CategoryKind, Manifest, ManifestEntry};
use carve_renderer::Renderer;

use crate::amalgamate::{aggregate_path, render, AggregatePlan};
use crate::error::{io_err, SyncError};
use crate::writer::files_identical;

/// State of one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Destination matches upstream byte for byte.
    Current,
    /// Destination exists but differs.
    Outdated,
    /// Destination absent.
    Missing,
    /// Upstream absent; a sync would fail on this entry.
    SourceMissing,
}

impl EntryState {
    pub fn label(&self) -> &'static str {
        match self {
            EntryState::Current => "current",
            EntryState::Outdated => "outdated",
            EntryState::Missing => "missing",
            EntryState::SourceMissing => "source-missing",
        }
    }

    /// `true` when a sync would copy (or fail on) this entry.
    pub fn needs_sync(&self) -> bool {
        !matches!(self, EntryState::Current)
    }
}

/// Status of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStatus {
    pub kind: CategoryKind,
    pub destination_root: PathBuf,
    pub entries: Vec<(ManifestEntry, EntryState)>,
    /// Files under the destination root that no manifest entry names,
    /// relative to that root and sorted.
    pub untracked: Vec<PathBuf>,
}

impl CategoryStatus {
    pub fn count(&self, state: EntryState) -> usize {
        self.entries.iter().filter(|(_, s)| *s == state).count()
    }
}

/// State of the aggregate unit: `Current` when the file on disk equals what
/// a sync would generate now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateStatus {
    pub path: PathBuf,
    pub state: EntryState,
}

/// Status of a whole vendored tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub categories: Vec<CategoryStatus>,
    pub aggregate: AggregateStatus,
}

impl StatusReport {
    pub fn count(&self, state: EntryState) -> usize {
        self.categories.iter().map(|c| c.count(state)).sum()
    }

    pub fn untracked(&self) -> usize {
        self.categories.iter().map(|c| c.untracked.len()).sum()
    }

    /// `true` when a sync would not change anything.
    pub fn is_clean(&self) -> bool {
        self.categories
            .iter()
            .all(|c| c.entries.iter().all(|(_, s)| !s.needs_sync()))
            && !self.aggregate.state.needs_sync()
    }
}

/// Classify one entry of `category`.
pub fn entry_state(category: &Category, entry: &ManifestEntry) -> Result<EntryState, SyncError> {
    let source = category.source_path(entry);
    let destination = category.destination_path(entry);

    if !is_file(&source)? {
        return Ok(EntryState::SourceMissing);
    }
    if !is_file(&destination)? {
        return Ok(EntryState::Missing);
    }
    if files_identical(&source, &destination)? {
        Ok(EntryState::Current)
    } else {
        Ok(EntryState::Outdated)
    }
}

/// Classify every entry of `category` and list untracked destination files.
pub fn check(category: &Category) -> Result<CategoryStatus, SyncError> {
    let mut entries = Vec::with_capacity(category.entries.len());
    for entry in &category.entries {
        entries.push((entry.clone(), entry_state(category, entry)?));
    }

    let tracked: BTreeSet<PathBuf> = category
        .entries
        .iter()
        .map(|e| category.destination_path(e))
        .collect();
    let untracked = walk_files(&category.destination_root)?
        .into_iter()
        .filter(|path| !tracked.contains(path))
        .filter_map(|path| relative(&path, &category.destination_root))
        .collect();

    Ok(CategoryStatus {
        kind: category.kind,
        destination_root: category.destination_root.clone(),
        entries,
        untracked,
    })
}

/// Status of every category of `manifest` plus the aggregate unit.
///
/// A file is untracked only if no category and not the aggregate claim it.
/// When destination roots nest, the file is listed under the deepest root
/// that contains it.
pub fn check_all(
    manifest: &Manifest,
    upstream: &Path,
    dest: &Path,
) -> Result<StatusReport, SyncError> {
    let categories = manifest.resolve(upstream, dest);
    let sources = manifest.resolve_category(CategoryKind::Sources, upstream, dest);
    let renderer = Renderer::new()?;
    let aggregate = aggregate_status(&renderer, &sources, &manifest.amalgamation)?;

    let mut tracked: BTreeSet<PathBuf> = categories
        .iter()
        .flat_map(|c| c.entries.iter().map(move |e| c.destination_path(e)))
        .collect();
    tracked.insert(aggregate.path.clone());

    let roots: Vec<PathBuf> = categories.iter().map(|c| c.destination_root.clone()).collect();

    let mut statuses = Vec::with_capacity(categories.len());
    for category in &categories {
        let mut status = check(category)?;
        let root = &category.destination_root;
        status.untracked.retain(|rel| {
            let full = root.join(rel);
            !tracked.contains(&full) && owning_root(&roots, &full) == Some(root)
        });
        statuses.push(status);
    }

    Ok(StatusReport {
        categories: statuses,
        aggregate,
    })
}

/// Compare the aggregate on disk with a fresh rendering.
pub fn aggregate_status(
    renderer: &Renderer,
    sources: &Category,
    settings: &AmalgamationSettings,
) -> Result<AggregateStatus, SyncError> {
    let plan = AggregatePlan::new(&sources.entries, settings);
    let expected = render(renderer, &plan, settings)?;
    let path = aggregate_path(sources, settings);

    let state = match std::fs::read(&path) {
        Ok(existing) if existing == expected.as_bytes() => EntryState::Current,
        Ok(_) => EntryState::Outdated,
        Err(err) if err.kind() == ErrorKind::NotFound => EntryState::Missing,
        Err(err) => return Err(io_err(&path, err)),
    };
    Ok(AggregateStatus { path, state })
}

fn is_file(path: &Path) -> Result<bool, SyncError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(path, err)),
    }
}

fn relative(path: &Path, root: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Deepest root containing `path`.
fn owning_root<'a>(roots: &'a [PathBuf], path: &Path) -> Option<&'a PathBuf> {
    roots
        .iter()
        .filter(|root| path.starts_with(root))
        .max_by_key(|root| root.components().count())
}

/// All regular files under `root`, sorted. A missing root yields nothing.
fn walk_files(root: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let read = match std::fs::read_dir(&dir) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(io_err(&dir, err)),
        };
        for entry in read {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}
