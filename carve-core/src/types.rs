//! Domain types for carve manifests.
//!
//! Filesystem locations use `PathBuf`. Manifest entries keep their
//! `/`-separated spelling so that generated `#include` lines are identical on
//! every host, and are converted to native paths only at the filesystem edge.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A file path relative to a category root, spelled with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestEntry(pub String);

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ManifestEntry {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ManifestEntry {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl ManifestEntry {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Native relative path for filesystem access.
    pub fn to_path(&self) -> PathBuf {
        self.segments().collect()
    }

    /// Check that the entry names a file strictly below its category root.
    ///
    /// Returns the reason on rejection.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.0.is_empty() {
            return Err("path is empty");
        }
        if self.0.contains('\\') {
            return Err("backslash separators are not allowed; use '/'");
        }
        if self.0.chars().any(|c| c == '"' || c.is_control()) {
            return Err("quotes and control characters are not allowed");
        }
        if self.0.starts_with('/') {
            return Err("absolute paths are not allowed");
        }
        for segment in self.segments() {
            match segment {
                "" => return Err("path contains an empty segment"),
                "." | ".." => return Err("'.' and '..' segments are not allowed"),
                s if s.contains(':') => return Err("drive or stream prefixes are not allowed"),
                _ => {}
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The three manifest partitions, each with its own source/destination pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Headers,
    Sources,
    Tests,
}

impl CategoryKind {
    /// All categories in processing order.
    pub fn all() -> &'static [CategoryKind] {
        &[CategoryKind::Headers, CategoryKind::Sources, CategoryKind::Tests]
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryKind::Headers => "headers",
            CategoryKind::Sources => "sources",
            CategoryKind::Tests => "tests",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Manifest structs
// ---------------------------------------------------------------------------

/// Where one category lives upstream and in the vendored tree, and which
/// files it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLayout {
    /// Directory under the upstream root that entries are relative to.
    pub source: PathBuf,
    /// Directory under the destination root that entries are mirrored into.
    pub destination: PathBuf,
    #[serde(default)]
    pub files: Vec<ManifestEntry>,
}

impl CategoryLayout {
    pub fn new<I, E>(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, files: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ManifestEntry>,
    {
        Self {
            source: source.into(),
            destination: destination.into(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// Settings for the generated aggregate translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmalgamationSettings {
    /// Aggregate file, relative to the sources destination directory.
    pub output: ManifestEntry,
    /// Macro undefined after every inclusion.
    pub undef_macro: String,
    /// Entries ending in one of these are fragments: copied, never included.
    pub fragment_suffixes: Vec<String>,
}

impl Default for AmalgamationSettings {
    fn default() -> Self {
        Self {
            output: ManifestEntry::from("Support.cpp"),
            undef_macro: "DEBUG_TYPE".to_string(),
            fragment_suffixes: vec![".inc".to_string()],
        }
    }
}

impl AmalgamationSettings {
    /// `true` when `entry` is meant for textual inclusion by a
    /// platform-specific counterpart and must stay out of the aggregate.
    pub fn is_fragment(&self, entry: &ManifestEntry) -> bool {
        self.fragment_suffixes
            .iter()
            .any(|suffix| entry.as_str().ends_with(suffix.as_str()))
    }
}

/// The full vendoring manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub amalgamation: AmalgamationSettings,
    pub headers: CategoryLayout,
    pub sources: CategoryLayout,
    pub tests: CategoryLayout,
}

impl Manifest {
    pub fn layout(&self, kind: CategoryKind) -> &CategoryLayout {
        match kind {
            CategoryKind::Headers => &self.headers,
            CategoryKind::Sources => &self.sources,
            CategoryKind::Tests => &self.tests,
        }
    }

    /// Bind one category to concrete upstream and destination roots.
    pub fn resolve_category(&self, kind: CategoryKind, upstream: &Path, dest: &Path) -> Category {
        let layout = self.layout(kind);
        Category {
            kind,
            source_root: upstream.join(&layout.source),
            destination_root: dest.join(&layout.destination),
            entries: layout.files.clone(),
        }
    }

    /// All categories, in processing order.
    pub fn resolve(&self, upstream: &Path, dest: &Path) -> Vec<Category> {
        CategoryKind::all()
            .iter()
            .map(|kind| self.resolve_category(*kind, upstream, dest))
            .collect()
    }

    /// Reject malformed entries and any entry, in any category, whose
    /// destination is the aggregate output path.
    pub fn validate(&self) -> Result<(), ManifestError> {
        for kind in CategoryKind::all() {
            for entry in &self.layout(*kind).files {
                entry.check().map_err(|reason| ManifestError::InvalidEntry {
                    category: *kind,
                    entry: entry.clone(),
                    reason,
                })?;
            }
        }

        let settings = &self.amalgamation;
        settings
            .output
            .check()
            .map_err(|reason| ManifestError::InvalidAmalgamation {
                reason: format!("output '{}': {reason}", settings.output),
            })?;
        if !is_c_identifier(&settings.undef_macro) {
            return Err(ManifestError::InvalidAmalgamation {
                reason: format!("'{}' is not a C identifier", settings.undef_macro),
            });
        }
        if settings.fragment_suffixes.iter().any(String::is_empty) {
            return Err(ManifestError::InvalidAmalgamation {
                reason: "fragment suffixes must not be empty".to_string(),
            });
        }
        let aggregate = self.sources.destination.join(settings.output.to_path());
        for kind in CategoryKind::all() {
            let layout = self.layout(*kind);
            if let Some(entry) = layout
                .files
                .iter()
                .find(|e| layout.destination.join(e.to_path()) == aggregate)
            {
                return Err(ManifestError::AggregateCollision {
                    category: *kind,
                    entry: entry.clone(),
                });
            }
        }
        Ok(())
    }

    /// Entries listed more than once within the same category, in first-seen
    /// order.
    pub fn duplicates(&self) -> Vec<(CategoryKind, ManifestEntry)> {
        let mut out = Vec::new();
        for kind in CategoryKind::all() {
            let mut seen = BTreeSet::new();
            let mut reported = BTreeSet::new();
            for entry in &self.layout(*kind).files {
                if !seen.insert(entry) && reported.insert(entry) {
                    out.push((*kind, entry.clone()));
                }
            }
        }
        out
    }
}

/// A category bound to concrete roots for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub kind: CategoryKind,
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    pub entries: Vec<ManifestEntry>,
}

impl Category {
    pub fn source_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.source_root.join(entry.to_path())
    }

    pub fn destination_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.destination_root.join(entry.to_path())
    }
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
