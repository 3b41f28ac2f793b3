//! `carve diff`: unified diffs from the vendored tree to upstream.

use anyhow::{Context, Result};
use clap::Args;

use carve_sync::diff::diff_all;

use super::TreeArgs;

/// Arguments for `carve diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub tree: TreeArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let manifest = self.tree.load()?;
        let diffs = diff_all(&manifest, &self.tree.upstream, &self.tree.dest)
            .with_context(|| format!("diff against {} failed", self.tree.upstream.display()))?;

        if diffs.is_empty() {
            println!("No differences in {}.", self.tree.dest.display());
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        Ok(())
    }
}
