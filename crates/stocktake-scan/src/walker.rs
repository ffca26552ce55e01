//! Breadth-first directory walker.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use stocktake_core::{
    AccessLog, Entry, EntryReader, Inventory, ScanConfig, ScanError, ScanSummary, WalkFailure,
};

use crate::progress::{NoProgress, ScanObserver, ScanProgress};

/// Entries collected by one walk, in discovery order.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Collected entries, unsorted.
    pub entries: Vec<Entry>,
    /// Counters for the walk.
    pub summary: ScanSummary,
}

impl ScanOutcome {
    /// Whether the walk stopped on cancellation.
    pub fn interrupted(&self) -> bool {
        self.summary.interrupted
    }

    /// Hand the entries to `inventory`, replacing its previous snapshot.
    pub fn load_into(self, inventory: &mut Inventory) {
        inventory.load_with_summary(self.entries, self.summary);
    }

    /// Build a fresh inventory from the entries.
    pub fn into_inventory(self) -> Inventory {
        let mut inventory = Inventory::new();
        self.load_into(&mut inventory);
        inventory
    }
}

/// Transient state of one walk.
struct ScanState {
    queue: VecDeque<(PathBuf, u32)>,
    cancelled: bool,
    dirs_processed: u64,
    entries_found: u64,
    failures: u64,
    max_depth: u32,
}

impl ScanState {
    fn new(root: PathBuf) -> Self {
        Self {
            queue: VecDeque::from([(root, 0)]),
            cancelled: false,
            dirs_processed: 0,
            entries_found: 0,
            failures: 0,
            max_depth: 0,
        }
    }
}

/// Walks a directory tree level by level from an explicit FIFO queue.
///
/// Symlinks are recorded as entries but never followed. Failures below the
/// root are written to the access log and skipped; only an unusable root
/// fails the scan.
pub struct Walker {
    config: ScanConfig,
    log: Arc<AccessLog>,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl Walker {
    /// Create a walker for `config`, journaling failures to `log`.
    pub fn new(config: ScanConfig, log: Arc<AccessLog>) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            log,
            progress_tx,
        }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Configuration this walker scans with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Walk the whole tree without progress reporting or cancellation.
    pub fn scan_all(&self) -> Result<ScanOutcome, ScanError> {
        self.scan(&CancellationToken::new(), &mut NoProgress)
    }

    /// Walk the tree under the configured root.
    ///
    /// `cancel` is polled before each directory is listed; once it is
    /// observed the walk stops and returns what it has collected with
    /// `interrupted` set. `observer` is called every
    /// `progress_interval` directories and once more at the end.
    pub fn scan<O>(
        &self,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<ScanOutcome, ScanError>
    where
        O: ScanObserver + ?Sized,
    {
        let start = Instant::now();
        let root = self.check_root()?;
        tracing::info!(root = %root.display(), "scan started");

        let mut reader = EntryReader::new(self.config.block_size);
        let mut state = ScanState::new(root.clone());
        let mut entries = Vec::new();
        let interval = self.config.progress_interval.max(1) as u64;
        let mut current = root;

        while !state.queue.is_empty() {
            if cancel.is_cancelled() {
                state.cancelled = true;
                break;
            }
            let Some((dir, depth)) = state.queue.pop_front() else {
                break;
            };
            state.max_depth = state.max_depth.max(depth);

            let listed =
                self.process_directory(&dir, depth, &mut reader, &mut state, &mut entries);
            current = dir;

            if listed && state.dirs_processed % interval == 0 {
                self.emit_progress(&state, &current, start, observer);
            }
        }

        self.emit_progress(&state, &current, start, observer);

        let summary = ScanSummary {
            dirs_processed: state.dirs_processed,
            entries_found: state.entries_found,
            failures: state.failures,
            elapsed: start.elapsed(),
            interrupted: state.cancelled,
        };
        tracing::info!(
            dirs = summary.dirs_processed,
            entries = summary.entries_found,
            failures = summary.failures,
            max_depth = state.max_depth,
            interrupted = summary.interrupted,
            "scan finished"
        );

        Ok(ScanOutcome { entries, summary })
    }

    /// The root must exist, be a directory and be listable.
    fn check_root(&self) -> Result<PathBuf, ScanError> {
        let requested = &self.config.root;
        let root = requested
            .canonicalize()
            .map_err(|e| ScanError::root_io(requested, &e))?;

        let metadata = fs::metadata(&root).map_err(|e| ScanError::root_io(&root, &e))?;
        if !metadata.is_dir() {
            return Err(ScanError::RootUnavailable {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        fs::read_dir(&root).map_err(|e| ScanError::root_io(&root, &e))?;
        Ok(root)
    }

    /// List one directory, collecting its children and queueing
    /// subdirectories. Returns `false` if the directory could not be listed.
    fn process_directory(
        &self,
        dir: &Path,
        depth: u32,
        reader: &mut EntryReader,
        state: &mut ScanState,
        entries: &mut Vec<Entry>,
    ) -> bool {
        let children = match fs::read_dir(dir) {
            Ok(children) => children,
            Err(err) => {
                self.absorb(WalkFailure::unlistable(dir, &err), state);
                return false;
            }
        };
        state.dirs_processed += 1;

        for child in children {
            let child = match child {
                Ok(child) => child,
                Err(err) => {
                    self.absorb(WalkFailure::unreadable(dir, &err), state);
                    continue;
                }
            };

            let path = child.path();
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                Err(err) => {
                    self.absorb(WalkFailure::unreadable(&path, &err), state);
                    continue;
                }
            };

            let entry = reader.from_metadata(path, &metadata);
            if entry.is_dir {
                state.queue.push_back((entry.path.clone(), depth + 1));
            }
            state.entries_found += 1;
            entries.push(entry);
        }
        true
    }

    fn absorb(&self, failure: WalkFailure, state: &mut ScanState) {
        tracing::debug!(%failure, "skipping");
        self.log.record_failure(&failure);
        state.failures += 1;
    }

    fn emit_progress<O>(&self, state: &ScanState, current: &Path, start: Instant, observer: &mut O)
    where
        O: ScanObserver + ?Sized,
    {
        let progress = ScanProgress {
            dirs_processed: state.dirs_processed,
            entries_found: state.entries_found,
            failures: state.failures,
            dirs_queued: state.queue.len(),
            current_path: current.to_path_buf(),
            elapsed: start.elapsed(),
        };
        observer.on_progress(&progress);
        let _ = self.progress_tx.send(progress);
    }
}
