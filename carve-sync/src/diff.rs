//! Unified diffs from the vendored copy to upstream, for `carve diff`.
//!
//! Headers are `a/<path>` (destination) and `b/<path>` (upstream), with
//! `<path>` relative to the destination root. Nothing is written.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use carve_core::types::{Category, CategoryKind, Manifest};
use carve_renderer::Renderer;

use crate::amalgamate::{aggregate_path, render, AggregatePlan};
use crate::error::{io_err, SyncError};
use crate::status::{entry_state, EntryState};

/// A single file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Destination path of the file.
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Diffs for every outdated or missing entry of `category`.
///
/// An entry with no upstream file is an error, as it would be for sync.
pub fn diff_category(category: &Category, dest: &Path) -> Result<Vec<FileDiff>, SyncError> {
    let mut diffs = Vec::new();
    for entry in &category.entries {
        match entry_state(category, entry)? {
            EntryState::Current => continue,
            EntryState::SourceMissing => {
                return Err(SyncError::MissingSource {
                    category: category.kind,
                    entry: entry.clone(),
                    path: category.source_path(entry),
                })
            }
            EntryState::Outdated | EntryState::Missing => {}
        }
        let destination = category.destination_path(entry);
        let old = read_or_empty(&destination)?;
        let new = read_or_empty(&category.source_path(entry))?;
        diffs.push(FileDiff {
            unified_diff: unified(&display_path(&destination, dest), &old, &new),
            path: destination,
        });
    }
    Ok(diffs)
}

/// Diffs for every category of `manifest`, then the aggregate unit.
pub fn diff_all(
    manifest: &Manifest,
    upstream: &Path,
    dest: &Path,
) -> Result<Vec<FileDiff>, SyncError> {
    let mut diffs = Vec::new();
    for category in manifest.resolve(upstream, dest) {
        diffs.extend(diff_category(&category, dest)?);
    }

    let sources = manifest.resolve_category(CategoryKind::Sources, upstream, dest);
    let settings = &manifest.amalgamation;
    let renderer = Renderer::new()?;
    let plan = AggregatePlan::new(&sources.entries, settings);
    let expected = render(&renderer, &plan, settings)?;
    let path = aggregate_path(&sources, settings);
    let existing = read_or_empty(&path)?;
    if existing != expected.as_bytes() {
        diffs.push(FileDiff {
            unified_diff: unified(&display_path(&path, dest), &existing, expected.as_bytes()),
            path,
        });
    }
    Ok(diffs)
}

fn read_or_empty(path: &Path) -> Result<Vec<u8>, SyncError> {
    match std::fs::read(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

/// `/`-separated path relative to `dest`, for diff headers.
fn display_path(path: &Path, dest: &Path) -> String {
    let relative = path.strip_prefix(dest).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn unified(relative: &str, old: &[u8], new: &[u8]) -> String {
    let old_header = format!("a/{relative}");
    let new_header = format!("b/{relative}");
    match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old), Ok(new)) => TextDiff::from_lines(old, new)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string(),
        _ => format!("Binary files {old_header} and {new_header} differ\n"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use carve_core::types::{AmalgamationSettings, CategoryLayout};
    use tempfile::TempDir;

    use crate::pipeline::{run, Silent, SyncOptions};

    use super::*;

    fn put(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn manifest() -> Manifest {
        Manifest {
            amalgamation: AmalgamationSettings::default(),
            headers: CategoryLayout::new("llvm/include", "include", ["llvm/a.h"]),
            sources: CategoryLayout::new("llvm/lib", "lib", ["Support/x.cpp"]),
            tests: CategoryLayout::new("llvm/unittests", "tests", Vec::<String>::new()),
        }
    }

    fn upstream(root: &Path) {
        put(&root.join("llvm/include/llvm/a.h"), b"#pragma once\nint a;\n");
        put(&root.join("llvm/lib/Support/x.cpp"), b"int x = 1;\n");
    }

    #[test]
    fn no_diffs_after_clean_sync() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        upstream(up.path());
        run(&manifest(), up.path(), dst.path(), SyncOptions::default(), &mut Silent).unwrap();

        let diffs = diff_all(&manifest(), up.path(), dst.path()).unwrap();
        assert!(diffs.is_empty(), "{diffs:?}");
    }

    #[test]
    fn local_edit_produces_unified_diff() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        upstream(up.path());
        run(&manifest(), up.path(), dst.path(), SyncOptions::default(), &mut Silent).unwrap();
        fs::write(dst.path().join("lib/Support/x.cpp"), "int x = 2;\n").unwrap();

        let diffs = diff_all(&manifest(), up.path(), dst.path()).unwrap();
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0].unified_diff;
        assert!(diff.contains("--- a/lib/Support/x.cpp"), "{diff}");
        assert!(diff.contains("+++ b/lib/Support/x.cpp"), "{diff}");
        assert!(diff.contains("-int x = 2;"), "{diff}");
        assert!(diff.contains("+int x = 1;"), "{diff}");
    }

    #[test]
    fn fresh_destination_diffs_every_file_and_aggregate() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        upstream(up.path());

        let diffs = diff_all(&manifest(), up.path(), dst.path()).unwrap();
        let paths: Vec<_> = diffs
            .iter()
            .map(|d| d.path.strip_prefix(dst.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("include/llvm/a.h"),
                PathBuf::from("lib/Support/x.cpp"),
                PathBuf::from("lib/Support.cpp"),
            ]
        );
        assert!(diffs[2].unified_diff.contains("+#include \"Support/x.cpp\""));
        assert!(!dst.path().join("lib").exists(), "diff must not write");
    }

    #[test]
    fn non_utf8_files_are_reported_as_binary() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        upstream(up.path());
        put(&up.path().join("llvm/lib/Support/x.cpp"), &[0xff, 0xfe, 0x00]);

        let sources = manifest().resolve_category(CategoryKind::Sources, up.path(), dst.path());
        let diffs = diff_category(&sources, dst.path()).unwrap();
        assert_eq!(
            diffs[0].unified_diff,
            "Binary files a/lib/Support/x.cpp and b/lib/Support/x.cpp differ\n"
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let err = diff_all(&manifest(), up.path(), dst.path()).unwrap_err();
        assert!(matches!(err, SyncError::MissingSource { .. }), "{err:?}");
    }
}
