//! `carve sync`: copy changed files and regenerate the aggregate unit.

use anyhow::{Context, Result};
use clap::Args;

use carve_core::types::{Category, ManifestEntry};
use carve_sync::{pipeline, AggregateResult, Progress, SyncOptions, WriteResult};

use super::TreeArgs;

/// Arguments for `carve sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Show what would be copied without writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip regenerating the aggregate unit.
    #[arg(long)]
    pub no_amalgamate: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let manifest = self.tree.load()?;
        let options = SyncOptions {
            dry_run: self.dry_run,
            amalgamate: !self.no_amalgamate,
        };

        let mut printer = ConsoleProgress::new(self.dry_run);
        let report = pipeline::run(
            &manifest,
            &self.tree.upstream,
            &self.tree.dest,
            options,
            &mut printer,
        )
        .with_context(|| {
            format!(
                "sync from {} into {} failed",
                self.tree.upstream.display(),
                self.tree.dest.display()
            )
        })?;

        println!(
            "{}✓ {} copied, {} up to date",
            printer.prefix,
            report.written(),
            report.unchanged()
        );
        println!("{}Done", printer.prefix);
        Ok(())
    }
}

/// Streams one line per event to stdout as the run advances.
struct ConsoleProgress {
    prefix: &'static str,
}

impl ConsoleProgress {
    fn new(dry_run: bool) -> Self {
        Self {
            prefix: if dry_run { "[dry-run] " } else { "" },
        }
    }
}

impl Progress for ConsoleProgress {
    fn category_started(&mut self, category: &Category) {
        println!(
            "{}{} ({} files) → {}",
            self.prefix,
            category.kind,
            category.entries.len(),
            category.destination_root.display()
        );
    }

    fn entry(&mut self, _category: &Category, entry: &ManifestEntry, result: &WriteResult) {
        match result {
            WriteResult::Unchanged { path } => {
                println!("  ·  {} is up to date", path.display())
            }
            WriteResult::Written { path } => {
                println!("  ✎  copied {entry} to {}", path.display())
            }
            WriteResult::WouldWrite { path } => {
                println!("  ~  would copy {entry} to {}", path.display())
            }
        }
    }

    fn amalgamated(&mut self, result: &AggregateResult) {
        let included = result.plan.included().count();
        let excluded = result.plan.excluded().count();
        let path = result.write.path().display();
        match result.write {
            WriteResult::Written { .. } => println!(
                "{}✎  generated {path} ({included} sources, {excluded} fragments skipped)",
                self.prefix
            ),
            WriteResult::WouldWrite { .. } => println!(
                "{}~  would generate {path} ({included} sources, {excluded} fragments skipped)",
                self.prefix
            ),
            WriteResult::Unchanged { .. } => {
                println!("{}·  {path} is up to date", self.prefix)
            }
        }
    }
}
