//! Core types for stocktake.
//!
//! This crate holds the pieces shared by the walker and the mutation
//! service: inventory entries, listing-style formatting, the sorted
//! inventory, the access log and the error taxonomy.

mod access_log;
mod config;
mod entry;
mod error;
pub mod format;
mod inventory;

pub use access_log::{AccessLog, AccessLogEntry, DEFAULT_LOG_PATH, LogKind};
pub use config::{DEFAULT_BLOCK_SIZE, DEFAULT_PROGRESS_INTERVAL, ScanConfig, ScanConfigBuilder};
pub use entry::{Entry, EntryKind, EntryReader};
pub use error::{InventoryError, LogError, ScanError, WalkFailure};
pub use format::ReferenceYear;
pub use inventory::{Inventory, ScanSummary, listing_order};
