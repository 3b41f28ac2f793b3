//! carve: vendor a fixed subset of an upstream source tree and generate
//! its aggregate translation unit.
//!
//! # Usage
//!
//! ```text
//! carve sync <upstream> <dest> [--manifest FILE] [--dry-run] [--no-amalgamate]
//! carve status <upstream> <dest> [--manifest FILE] [--json]
//! carve diff <upstream> <dest> [--manifest FILE]
//! carve manifest [--output FILE]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, manifest::ManifestArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "carve",
    version,
    about = "Vendor a fixed subset of an upstream source tree",
    long_about = None,
)]
struct Cli {
    /// Log progress details to stderr (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy changed files from upstream and regenerate the aggregate unit.
    Sync(SyncArgs),

    /// Show which vendored files differ from upstream.
    Status(StatusArgs),

    /// Show unified diffs of what sync would change.
    Diff(DiffArgs),

    /// Print or export the built-in manifest.
    Manifest(ManifestArgs),
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Manifest(args) => args.run(),
    }
}
