//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Directories whose children have been enumerated.
    pub dirs_processed: u64,
    /// Entries collected so far.
    pub entries_found: u64,
    /// Failures logged and skipped so far.
    pub failures: u64,
    /// Directories still waiting in the queue.
    pub dirs_queued: usize,
    /// Directory processed most recently.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            dirs_processed: 0,
            entries_found: 0,
            failures: 0,
            dirs_queued: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.entries_found as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Hook invoked by the walker every `progress_interval` directories.
///
/// This is the walk's yield point: the host can report liveness here and
/// cancel the scan's token, which the walker observes before the next
/// directory.
pub trait ScanObserver {
    fn on_progress(&mut self, progress: &ScanProgress);
}

impl<F> ScanObserver for F
where
    F: FnMut(&ScanProgress),
{
    fn on_progress(&mut self, progress: &ScanProgress) {
        self(progress)
    }
}

/// Observer that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ScanObserver for NoProgress {
    fn on_progress(&mut self, _progress: &ScanProgress) {}
}
