//! `carve status`: per-category view of how the vendored tree differs from
//! upstream.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use carve_sync::status::{check_all, CategoryStatus, EntryState, StatusReport};

use super::TreeArgs;

/// Arguments for `carve status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let manifest = self.tree.load()?;
        let report = check_all(&manifest, &self.tree.upstream, &self.tree.dest)
            .context("status check failed")?;

        if self.json {
            print_json(&report, &self.tree.dest)?;
            return Ok(());
        }

        print_table(&report, &self.tree.dest);
        Ok(())
    }
}

const STATES: [EntryState; 4] = [
    EntryState::Current,
    EntryState::Outdated,
    EntryState::Missing,
    EntryState::SourceMissing,
];

#[derive(Serialize)]
struct StatusReportJson {
    summary: SummaryJson,
    categories: Vec<CategoryJson>,
    aggregate: FileJson,
}

#[derive(Serialize)]
struct SummaryJson {
    entries: usize,
    current: usize,
    outdated: usize,
    missing: usize,
    source_missing: usize,
    untracked: usize,
    clean: bool,
}

#[derive(Serialize)]
struct CategoryJson {
    category: String,
    destination: String,
    entries: Vec<FileJson>,
    untracked: Vec<String>,
}

#[derive(Serialize)]
struct FileJson {
    path: String,
    status: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "category")]
    category: String,
    #[tabled(rename = "current")]
    current: usize,
    #[tabled(rename = "outdated")]
    outdated: usize,
    #[tabled(rename = "missing")]
    missing: usize,
    #[tabled(rename = "source missing")]
    source_missing: usize,
    #[tabled(rename = "untracked")]
    untracked: usize,
}

fn print_json(report: &StatusReport, dest: &Path) -> Result<()> {
    let payload = StatusReportJson {
        summary: SummaryJson {
            entries: report.categories.iter().map(|c| c.entries.len()).sum(),
            current: report.count(EntryState::Current),
            outdated: report.count(EntryState::Outdated),
            missing: report.count(EntryState::Missing),
            source_missing: report.count(EntryState::SourceMissing),
            untracked: report.untracked(),
            clean: report.is_clean(),
        },
        categories: report
            .categories
            .iter()
            .map(|c| CategoryJson {
                category: c.kind.to_string(),
                destination: display_relative(&c.destination_root, dest),
                entries: c
                    .entries
                    .iter()
                    .map(|(entry, state)| FileJson {
                        path: entry.to_string(),
                        status: state.label().to_string(),
                    })
                    .collect(),
                untracked: c
                    .untracked
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect(),
            })
            .collect(),
        aggregate: FileJson {
            path: display_relative(&report.aggregate.path, dest),
            status: report.aggregate.state.label().to_string(),
        },
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: &StatusReport, dest: &Path) {
    println!(
        "carve v{} | {} entries | {} need sync | {} untracked",
        env!("CARGO_PKG_VERSION"),
        report.categories.iter().map(|c| c.entries.len()).sum::<usize>(),
        report.count(EntryState::Outdated)
            + report.count(EntryState::Missing)
            + report.count(EntryState::SourceMissing),
        report.untracked(),
    );

    let separator = "■".repeat(67).bright_black().to_string();
    println!("{separator}");
    let legend: Vec<String> = STATES
        .iter()
        .map(|s| format!("{} {}", state_indicator(*s), s.label().to_uppercase()))
        .collect();
    println!("Indicators: {}", legend.join("  "));
    println!("{separator}");

    let rows: Vec<StatusTableRow> = report
        .categories
        .iter()
        .map(|c| StatusTableRow {
            category: c.kind.to_string(),
            current: c.count(EntryState::Current),
            outdated: c.count(EntryState::Outdated),
            missing: c.count(EntryState::Missing),
            source_missing: c.count(EntryState::SourceMissing),
            untracked: c.untracked.len(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for category in &report.categories {
        print_details(category);
    }
    println!(
        "{} aggregate {}: {}",
        state_indicator(report.aggregate.state),
        display_relative(&report.aggregate.path, dest),
        report.aggregate.state.label()
    );
    println!("{separator}");

    if !report.is_clean() {
        println!("Run 'carve sync' to update the vendored tree.");
    }
}

/// Lists every entry that is not current, then untracked files.
fn print_details(category: &CategoryStatus) {
    let stale: Vec<_> = category
        .entries
        .iter()
        .filter(|(_, state)| state.needs_sync())
        .collect();
    if stale.is_empty() && category.untracked.is_empty() {
        return;
    }

    println!("{}", category.kind.label().to_uppercase().bold());
    for (entry, state) in stale {
        println!("  {} {entry} ({})", state_indicator(*state), state.label());
    }
    for path in &category.untracked {
        println!("  {} {} (untracked)", "?".magenta().bold(), path.display());
    }
}

fn state_indicator(state: EntryState) -> String {
    match state {
        EntryState::Current => "■".green().bold().to_string(),
        EntryState::Outdated => "■".yellow().bold().to_string(),
        EntryState::Missing => "■".bright_black().bold().to_string(),
        EntryState::SourceMissing => "■".red().bold().to_string(),
    }
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
