//! The sorted entry collection and its scan summary.

use std::cmp::Ordering;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::InventoryError;

/// Summary of one scan, handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Directories whose children were enumerated.
    pub dirs_processed: u64,
    /// Entries collected.
    pub entries_found: u64,
    /// Per-node failures that were logged and skipped.
    pub failures: u64,
    /// Wall time of the scan.
    pub elapsed: Duration,
    /// Whether the scan stopped on cancellation.
    pub interrupted: bool,
}

/// Ordered snapshot of one scan.
///
/// Directories come first, then everything else; within each group
/// entries are ordered byte-wise by path. Sorting happens only in
/// [`Inventory::load`], so a refreshed entry keeps its slot until the
/// next scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    entries: Vec<Entry>,
    summary: ScanSummary,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a scan result and sort it.
    pub fn load(&mut self, mut entries: Vec<Entry>, interrupted: bool) {
        entries.sort_by(listing_order);
        self.summary = ScanSummary {
            entries_found: entries.len() as u64,
            interrupted,
            ..ScanSummary::default()
        };
        self.entries = entries;
    }

    /// Replace the collection and keep the walker's full summary.
    pub fn load_with_summary(&mut self, entries: Vec<Entry>, summary: ScanSummary) {
        self.load(entries, summary.interrupted);
        self.summary = summary;
    }

    /// Entries on page `page_index`. Out-of-range pages are empty.
    pub fn slice(&self, page_index: usize, page_size: usize) -> &[Entry] {
        let Some(start) = page_index.checked_mul(page_size) else {
            return &[];
        };
        if page_size == 0 || start >= self.entries.len() {
            return &[];
        }
        let end = start.saturating_add(page_size).min(self.entries.len());
        &self.entries[start..end]
    }

    /// Number of pages of `page_size` entries.
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            0
        } else {
            self.entries.len().div_ceil(page_size)
        }
    }

    /// Look up an entry by exact path.
    pub fn find_by_path(&self, path: &Path) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Replace the entry at `path` with `entry`, keeping its position.
    ///
    /// `entry` may carry a different path (after a rename).
    pub fn refresh(&mut self, path: &Path, entry: Entry) -> Result<(), InventoryError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.path == path)
            .ok_or_else(|| InventoryError::EntryNotFound {
                path: path.to_path_buf(),
            })?;
        *slot = entry;
        Ok(())
    }

    /// All entries in listing order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Summary of the scan that produced this snapshot.
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    /// Whether the snapshot came from a cancelled scan.
    pub fn interrupted(&self) -> bool {
        self.summary.interrupted
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the inventory holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Directories first, then byte-wise by path.
pub fn listing_order(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir.cmp(&a.is_dir).then_with(|| {
        a.path
            .as_os_str()
            .as_encoded_bytes()
            .cmp(b.path.as_os_str().as_encoded_bytes())
    })
}
