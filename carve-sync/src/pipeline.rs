//! Run orchestration: headers, then sources, then tests, then amalgamation.
//!
//! The first error aborts the run. Files synchronized before the failure
//! stay byte-identical to upstream, so the next run picks up where this one
//! stopped.

use std::path::Path;

use carve_core::types::{Category, CategoryKind, Manifest, ManifestEntry};
use carve_renderer::Renderer;

use crate::amalgamate::{amalgamate, AggregateResult};
use crate::writer::{sync_category, SyncCategoryResult, WriteResult};
use crate::SyncError;

/// Receives progress as the run advances.
pub trait Progress {
    fn category_started(&mut self, _category: &Category) {}

    /// Called once per entry, in manifest order, as soon as it is decided.
    fn entry(&mut self, category: &Category, entry: &ManifestEntry, result: &WriteResult);

    fn amalgamated(&mut self, _result: &AggregateResult) {}
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn entry(&mut self, _category: &Category, _entry: &ManifestEntry, _result: &WriteResult) {}
}

/// Knobs for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Decide everything, write nothing.
    pub dry_run: bool,
    /// Regenerate the aggregate unit after the sources category.
    pub amalgamate: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            amalgamate: true,
        }
    }
}

/// Everything a completed run did.
#[derive(Debug)]
pub struct RunReport {
    pub categories: Vec<SyncCategoryResult>,
    pub aggregate: Option<AggregateResult>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.categories.iter().map(SyncCategoryResult::written).sum()
    }

    pub fn unchanged(&self) -> usize {
        self.categories.iter().map(SyncCategoryResult::unchanged).sum()
    }
}

/// Synchronize every category of `manifest` from `upstream` into `dest`,
/// then amalgamate the sources.
///
/// The manifest is validated first, so one built in code gets the same
/// checks as one loaded from a file. Nothing is written if it is invalid.
///
/// This is the canonical entrypoint used by `carve sync`.
pub fn run(
    manifest: &Manifest,
    upstream: &Path,
    dest: &Path,
    options: SyncOptions,
    progress: &mut dyn Progress,
) -> Result<RunReport, SyncError> {
    manifest.validate()?;
    let renderer = Renderer::new()?;
    let categories = manifest.resolve(upstream, dest);
    let mut results = Vec::with_capacity(categories.len());

    for category in &categories {
        progress.category_started(category);
        let mut on_entry = |entry: &ManifestEntry, write: &WriteResult| {
            progress.entry(category, entry, write)
        };
        let result = sync_category(category, options.dry_run, &mut on_entry)?;
        results.push(result);
    }

    let aggregate = if options.amalgamate {
        let sources = manifest.resolve_category(CategoryKind::Sources, upstream, dest);
        let result = amalgamate(
            &renderer,
            &sources,
            &manifest.amalgamation,
            options.dry_run,
        )?;
        progress.amalgamated(&result);
        Some(result)
    } else {
        None
    };

    Ok(RunReport {
        categories: results,
        aggregate,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use carve_core::types::{AmalgamationSettings, CategoryLayout};
    use carve_core::ManifestError;
    use tempfile::TempDir;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Progress for Recorder {
        fn category_started(&mut self, category: &Category) {
            self.events.push(format!("start {}", category.kind));
        }

        fn entry(&mut self, category: &Category, entry: &ManifestEntry, result: &WriteResult) {
            let verdict = if result.is_change() { "copied" } else { "unchanged" };
            self.events.push(format!("{} {entry} {verdict}", category.kind));
        }

        fn amalgamated(&mut self, _result: &AggregateResult) {
            self.events.push("amalgamated".to_string());
        }
    }

    fn manifest() -> Manifest {
        Manifest {
            amalgamation: AmalgamationSettings::default(),
            headers: CategoryLayout::new("llvm/include", "include", ["llvm/a.h"]),
            sources: CategoryLayout::new("llvm/lib", "lib", ["x.cpp"]),
            tests: CategoryLayout::new("llvm/unittests", "tests", ["t.cpp"]),
        }
    }

    fn upstream(root: &Path) {
        for (path, content) in [
            ("llvm/include/llvm/a.h", "#pragma once\n"),
            ("llvm/lib/x.cpp", "int x;"),
            ("llvm/unittests/t.cpp", "// test\n"),
        ] {
            let p = root.join(path);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, content).unwrap();
        }
    }

    #[test]
    fn events_follow_category_order() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        upstream(up.path());

        let mut recorder = Recorder::default();
        run(&manifest(), up.path(), dst.path(), SyncOptions::default(), &mut recorder)
            .expect("run");
        assert_eq!(
            recorder.events,
            vec![
                "start headers",
                "headers llvm/a.h copied",
                "start sources",
                "sources x.cpp copied",
                "start tests",
                "tests t.cpp copied",
                "amalgamated",
            ]
        );
    }

    #[test]
    fn no_amalgamate_skips_aggregate() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        upstream(up.path());

        let options = SyncOptions {
            amalgamate: false,
            ..SyncOptions::default()
        };
        let report = run(&manifest(), up.path(), dst.path(), options, &mut Silent).expect("run");
        assert!(report.aggregate.is_none());
        assert!(!dst.path().join("lib").join("Support.cpp").exists());
        assert_eq!(report.written(), 3);
    }

    #[test]
    fn manifest_built_in_code_is_validated_before_any_write() {
        let up = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        upstream(up.path());
        let mut bad = manifest();
        bad.tests = CategoryLayout::new("llvm/unittests", "tests", ["../escape.cpp"]);

        let mut recorder = Recorder::default();
        let err = run(&bad, up.path(), dst.path(), SyncOptions::default(), &mut recorder)
            .unwrap_err();
        assert!(
            matches!(
                err,
                SyncError::Manifest(ManifestError::InvalidEntry {
                    category: CategoryKind::Tests,
                    ..
                })
            ),
            "got: {err}"
        );
        assert!(recorder.events.is_empty());
        assert!(fs::read_dir(dst.path()).unwrap().next().is_none());
    }
}
