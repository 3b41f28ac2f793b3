//! Amalgamation: one aggregate translation unit for the vendored sources.
//!
//! Every non-fragment sources entry becomes
//!
//! ```text
//! #include "<entry>"
//! #undef <MACRO>
//! ```
//!
//! The `#undef` after each inclusion ends any per-file definition of the
//! debug-tag macro before the next source is included.

use std::io::ErrorKind;
use std::path::PathBuf;

use carve_core::types::{AmalgamationSettings, Category, ManifestEntry};
use carve_renderer::{AggregateContext, Renderer};

use crate::error::{io_err, SyncError};
use crate::writer::{write_atomic, WriteResult};

/// Per-entry amalgamation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inclusion {
    Included(ManifestEntry),
    /// Fragment-only file: vendored, but never compiled on its own.
    Excluded(ManifestEntry),
}

/// Inclusion decisions for a sources entry list, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatePlan {
    pub entries: Vec<Inclusion>,
}

impl AggregatePlan {
    pub fn new(entries: &[ManifestEntry], settings: &AmalgamationSettings) -> Self {
        let entries = entries
            .iter()
            .map(|entry| {
                if settings.is_fragment(entry) {
                    Inclusion::Excluded(entry.clone())
                } else {
                    Inclusion::Included(entry.clone())
                }
            })
            .collect();
        Self { entries }
    }

    pub fn included(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter_map(|i| match i {
            Inclusion::Included(entry) => Some(entry),
            Inclusion::Excluded(_) => None,
        })
    }

    pub fn excluded(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter_map(|i| match i {
            Inclusion::Excluded(entry) => Some(entry),
            Inclusion::Included(_) => None,
        })
    }
}

/// Outcome of an amalgamation run.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub plan: AggregatePlan,
    pub write: WriteResult,
}

/// Location of the aggregate unit for a sources category.
pub fn aggregate_path(sources: &Category, settings: &AmalgamationSettings) -> PathBuf {
    sources.destination_path(&settings.output)
}

/// Render the aggregate unit for `plan` without touching the filesystem.
pub fn render(
    renderer: &Renderer,
    plan: &AggregatePlan,
    settings: &AmalgamationSettings,
) -> Result<String, SyncError> {
    let ctx = AggregateContext::new(plan.included(), settings);
    Ok(renderer.render_aggregate(&ctx)?)
}

/// Fail with [`SyncError::Precondition`] unless every entry of `sources`
/// (fragments included) is present in the destination tree.
pub fn check_synchronized(sources: &Category) -> Result<(), SyncError> {
    for entry in &sources.entries {
        let path = sources.destination_path(entry);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(SyncError::Precondition {
                    entry: entry.clone(),
                    path,
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SyncError::Precondition {
                    entry: entry.clone(),
                    path,
                })
            }
            Err(err) => return Err(io_err(&path, err)),
        }
    }
    Ok(())
}

/// Generate the aggregate unit for an already synchronized `sources`
/// category.
///
/// The file is replaced in full on every non-dry run. In dry-run mode the
/// rendered unit is only compared with what is on disk.
pub fn amalgamate(
    renderer: &Renderer,
    sources: &Category,
    settings: &AmalgamationSettings,
    dry_run: bool,
) -> Result<AggregateResult, SyncError> {
    let plan = AggregatePlan::new(&sources.entries, settings);
    let content = render(renderer, &plan, settings)?;
    let path = aggregate_path(sources, settings);

    if dry_run {
        let write = match std::fs::read(&path) {
            Ok(existing) if existing == content.as_bytes() => WriteResult::Unchanged { path },
            Ok(_) => WriteResult::WouldWrite { path },
            Err(err) if err.kind() == ErrorKind::NotFound => WriteResult::WouldWrite { path },
            Err(err) => return Err(io_err(&path, err)),
        };
        return Ok(AggregateResult { plan, write });
    }

    check_synchronized(sources)?;
    write_atomic(&path, content.as_bytes())?;
    tracing::info!(
        "amalgamated {} sources into {}",
        plan.included().count(),
        path.display()
    );
    Ok(AggregateResult {
        plan,
        write: WriteResult::Written { path },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
