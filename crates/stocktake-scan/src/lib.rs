//! Directory walking for stocktake.
//!
//! # Overview
//!
//! `stocktake-scan` walks a directory tree breadth-first from an explicit
//! work queue and collects one [`Entry`] per object found. Key properties:
//!
//! - **No symlink traversal**: links are stat'ed as links and never entered
//! - **Failure tolerant**: unreadable entries and unlistable directories are
//!   journaled to the [`AccessLog`] and skipped
//! - **Cooperative cancellation** via a [`CancellationToken`], polled before
//!   each directory
//! - **Progress hook** called every `progress_interval` directories, plus a
//!   broadcast channel for observers on other tasks
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use stocktake_scan::{AccessLog, CancellationToken, ScanConfig, ScanProgress, Walker};
//!
//! let log = Arc::new(AccessLog::open("stocktake_access.log"));
//! let walker = Walker::new(ScanConfig::new("/path/to/scan"), log);
//!
//! let cancel = CancellationToken::new();
//! let outcome = walker
//!     .scan(&cancel, &mut |p: &ScanProgress| {
//!         eprintln!("{} dirs, {} entries", p.dirs_processed, p.entries_found);
//!     })
//!     .unwrap();
//!
//! let inventory = outcome.into_inventory();
//! for entry in inventory.slice(0, 20) {
//!     println!("{} {} {}", entry.permissions, entry.date, entry.path.display());
//! }
//! ```

mod progress;
mod walker;

pub use progress::{NoProgress, ScanObserver, ScanProgress};
pub use walker::{ScanOutcome, Walker};

pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use stocktake_core::{
    AccessLog, Entry, EntryKind, Inventory, ScanConfig, ScanError, ScanSummary, WalkFailure,
};
