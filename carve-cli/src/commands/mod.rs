//! Subcommand implementations. Each `*Args` struct owns a `run` method.

pub mod diff;
pub mod manifest;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Args;

use carve_core::{manifest as manifest_file, Manifest};

/// Roots and manifest selection shared by `sync`, `status` and `diff`.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Root of the upstream checkout.
    pub upstream: PathBuf,

    /// Root of the vendored tree.
    pub dest: PathBuf,

    /// Manifest file (default: ./carve.yaml, then the built-in manifest).
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,
}

impl TreeArgs {
    /// Resolve the effective manifest and check that the upstream root exists.
    pub fn load(&self) -> Result<Manifest> {
        ensure!(
            self.upstream.is_dir(),
            "upstream root {} is not a directory",
            self.upstream.display()
        );
        load_manifest(self.manifest.as_deref())
    }
}

/// `--manifest` > `./carve.yaml` > built-in default.
pub fn load_manifest(explicit: Option<&Path>) -> Result<Manifest> {
    if let Some(path) = explicit {
        tracing::info!("using manifest {}", path.display());
        return manifest_file::load_at(path)
            .with_context(|| format!("failed to load manifest {}", path.display()));
    }

    let cwd = std::env::current_dir().context("could not determine working directory")?;
    if let Some(path) = manifest_file::discover_at(&cwd) {
        tracing::info!("using manifest {}", path.display());
        return manifest_file::load_at(&path)
            .with_context(|| format!("failed to load manifest {}", path.display()));
    }

    tracing::info!("using built-in manifest");
    manifest_file::default_manifest().context("built-in manifest is invalid")
}
