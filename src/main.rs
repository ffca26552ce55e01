//! stocktake - recursive filesystem inventory with ls-style metadata.
//!
//! Usage:
//!   stocktake scan [PATH]                 List one page of the inventory
//!   stocktake rename <PATH> <NEW_NAME>    Rename an entry
//!   stocktake chmod <PATH> <PERMISSIONS>  Change permissions, e.g. -rw-r--r--
//!   stocktake export [PATH]               Export the inventory to JSON
//!   stocktake --help                      Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Serialize;

use stocktake_core::{
    AccessLog, DEFAULT_BLOCK_SIZE, DEFAULT_LOG_PATH, DEFAULT_PROGRESS_INTERVAL, Entry, Inventory,
    ScanConfig, ScanSummary,
};
use stocktake_ops::{Mutation, MutationService};
use stocktake_scan::{CancellationToken, ScanProgress, Walker};

#[derive(Parser)]
#[command(
    name = "stocktake",
    version,
    about = "Recursive filesystem inventory",
    long_about = "stocktake walks a directory tree and lists every entry with its \
                  permissions, sizes and modification date, the way `ls -l` does. \
                  Unreadable entries and every rename or chmod are journaled to an \
                  access log."
)]
struct Cli {
    /// Access log file (falls back to stdout if it cannot be opened)
    #[arg(long, global = true, default_value = DEFAULT_LOG_PATH)]
    log: PathBuf,

    /// Allocation unit for allocated sizes
    #[arg(long, global = true, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and print one page of entries
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Page to show (0-based)
        #[arg(short, long, default_value = "0")]
        page: usize,

        /// Entries per page
        #[arg(short = 'n', long, default_value = "50")]
        page_size: usize,

        /// Directories between progress reports
        #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
        progress_interval: usize,

        /// Stop the scan after this many seconds and show what was found
        #[arg(short, long)]
        time_limit: Option<f64>,

        /// Print the page as JSON. Access log lines share stdout when the
        /// log file cannot be opened; pass a writable --log to keep the JSON clean.
        #[arg(long)]
        json: bool,
    },

    /// Rename an entry within its directory
    Rename {
        /// Entry to rename
        path: PathBuf,

        /// New file name (a single path component)
        new_name: String,

        /// Directory to scan before mutating (defaults to the entry's parent)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Set an entry's permissions from a listing string such as -rw-r--r--
    Chmod {
        /// Entry to change
        path: PathBuf,

        /// Ten-character permission string
        #[arg(allow_hyphen_values = true)]
        permissions: String,

        /// Directory to scan before mutating (defaults to the entry's parent)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Export the full inventory to JSON
    Export {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout, which the access log also falls
        /// back to when --log cannot be opened)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Snapshot<'a> {
    summary: &'a ScanSummary,
    entries: &'a [Entry],
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stocktake=info")),
        )
        .init();

    let cli = Cli::parse();
    let log = Arc::new(AccessLog::open(&cli.log));

    match cli.command {
        Command::Scan {
            path,
            page,
            page_size,
            progress_interval,
            time_limit,
            json,
        } => {
            let config = ScanConfig::builder()
                .root(path)
                .block_size(cli.block_size)
                .progress_interval(progress_interval)
                .build()
                .map_err(|e| eyre!("{e}"))?;
            let limit = time_limit.map(Duration::from_secs_f64);
            let inventory = run_scan(config, log, limit)?;
            print_page(&inventory, page, page_size, json)?;
        }
        Command::Rename {
            path,
            new_name,
            root,
        } => {
            run_mutation(&path, root, Mutation::rename(new_name), cli.block_size, log)?;
        }
        Command::Chmod {
            path,
            permissions,
            root,
        } => {
            run_mutation(&path, root, Mutation::chmod(permissions), cli.block_size, log)?;
        }
        Command::Export { path, output } => {
            let config = ScanConfig::builder()
                .root(path)
                .block_size(cli.block_size)
                .build()
                .map_err(|e| eyre!("{e}"))?;
            let inventory = run_scan(config, log, None)?;
            run_export(&inventory, output)?;
        }
    }

    Ok(())
}

/// Scan `config.root`, cancelling once `limit` has elapsed.
fn run_scan(
    config: ScanConfig,
    log: Arc<AccessLog>,
    limit: Option<Duration>,
) -> Result<Inventory> {
    eprintln!("Scanning {}...", config.root.display());

    let walker = Walker::new(config, log);
    let cancel = CancellationToken::new();
    let mut on_progress = |progress: &ScanProgress| {
        tracing::debug!(
            dirs = progress.dirs_processed,
            entries = progress.entries_found,
            queued = progress.dirs_queued,
            "scanning"
        );
        if limit.is_some_and(|limit| progress.elapsed >= limit) {
            cancel.cancel();
        }
    };

    let outcome = walker
        .scan(&cancel, &mut on_progress)
        .context("Scan failed")?;
    Ok(outcome.into_inventory())
}

/// Scan the entry's directory, then apply `mutation` to it.
fn run_mutation(
    path: &Path,
    root: Option<PathBuf>,
    mutation: Mutation,
    block_size: u64,
    log: Arc<AccessLog>,
) -> Result<()> {
    let target = entry_path(path)?;
    let root = match root {
        Some(root) => root,
        None => target
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| eyre!("{} has no parent directory", target.display()))?,
    };

    let config = ScanConfig::builder()
        .root(root)
        .block_size(block_size)
        .build()
        .map_err(|e| eyre!("{e}"))?;
    let mut inventory = run_scan(config, Arc::clone(&log), None)?;

    let mut service = MutationService::new(log, block_size);
    let result_path = service
        .apply(&mut inventory, &target, &mutation)
        .with_context(|| format!("{} {} failed", mutation.kind(), target.display()))?;

    if let Some(entry) = inventory.find_by_path(&result_path) {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// Absolute path of `path` without resolving a symlink in its last component.
fn entry_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| eyre!("{} does not name an entry", path.display()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = parent.canonicalize().context("Invalid path")?;
    Ok(parent.join(name))
}

/// Print the summary and one page of the inventory.
fn print_page(inventory: &Inventory, page: usize, page_size: usize, json: bool) -> Result<()> {
    let entries = inventory.slice(page, page_size);

    if json {
        let snapshot = Snapshot {
            summary: inventory.summary(),
            entries,
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let summary = inventory.summary();
    let total: u64 = inventory.entries().iter().map(|e| e.actual_size).sum();
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} entries in {} directories, {}",
        summary.entries_found,
        summary.dirs_processed,
        humansize::format_size(total, humansize::BINARY)
    );
    println!(" Scanned in {:.2}s", summary.elapsed.as_secs_f64());
    if summary.interrupted {
        println!(" Scan interrupted; showing a partial inventory");
    }
    if summary.failures > 0 {
        println!(" {} unreadable entries (see access log)", summary.failures);
    }
    println!(
        " Page {}/{}",
        page + 1,
        inventory.page_count(page_size).max(1)
    );
    println!("{}", "─".repeat(60));

    for entry in entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// One `ls -l` style line.
fn format_entry(entry: &Entry) -> String {
    format!(
        "{} {:>17} {} {}",
        entry.permissions,
        entry.size_display(),
        entry.date,
        entry.path.display()
    )
}

/// Export the inventory to JSON.
fn run_export(inventory: &Inventory, output: Option<PathBuf>) -> Result<()> {
    let snapshot = Snapshot {
        summary: inventory.summary(),
        entries: inventory.entries(),
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
