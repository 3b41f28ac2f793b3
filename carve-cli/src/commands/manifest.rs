//! `carve manifest`: print or export the built-in manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use carve_core::manifest;

/// Arguments for `carve manifest`.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Write the manifest to this file instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ManifestArgs {
    pub fn run(self) -> Result<()> {
        let Some(path) = self.output else {
            print!("{}", manifest::default_manifest_yaml());
            return Ok(());
        };

        let default = manifest::default_manifest().context("built-in manifest is invalid")?;
        manifest::save_at(&path, &default)
            .with_context(|| format!("failed to write manifest to {}", path.display()))?;
        println!("✓ wrote built-in manifest to {}", path.display());
        Ok(())
    }
}
