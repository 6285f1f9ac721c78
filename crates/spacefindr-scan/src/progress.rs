//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use spacefindr_core::{NodeId, StorageTree};

/// Progress counters during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of files added so far.
    pub files_scanned: u64,
    /// Number of directories entered so far.
    pub dirs_scanned: u64,
    /// Total bytes added so far.
    pub bytes_scanned: u64,
    /// Directory being enumerated.
    pub current_path: PathBuf,
    /// Number of recovered errors.
    pub errors_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_scanned: 0,
            dirs_scanned: 0,
            bytes_scanned: 0,
            current_path: PathBuf::new(),
            errors_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items scanned (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a progress report was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    /// Periodic report about the scan root, throttled by the configured interval.
    Tick,
    /// A directory finished enumerating its own children. Directories cut
    /// short by cancellation are never reported.
    DirectoryComplete,
}

/// A single progress report.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate<'a> {
    /// The tree being populated.
    pub tree: &'a StorageTree,
    /// The scan root for ticks, the finished directory otherwise.
    pub node: NodeId,
    /// Why this report was emitted.
    pub kind: ProgressKind,
    /// Counters at the time of the report.
    pub progress: &'a ScanProgress,
}

/// Receives progress reports from a running scan.
///
/// Reports are delivered sequentially on the scanning thread.
pub trait ProgressSink {
    /// Handle one report.
    fn report(&mut self, update: ProgressUpdate<'_>);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressUpdate<'_>),
{
    fn report(&mut self, update: ProgressUpdate<'_>) {
        self(update)
    }
}

/// A sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _update: ProgressUpdate<'_>) {}
}

/// Counters plus the time-based throttle for root reports.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    last_tick: Instant,
    interval: Duration,
    progress: ScanProgress,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_tick: now,
            interval,
            progress: ScanProgress::new(),
        }
    }

    pub fn record_file(&mut self, size: u64) {
        self.progress.files_scanned += 1;
        self.progress.bytes_scanned += size;
    }

    pub fn record_dir(&mut self, path: PathBuf) {
        self.progress.dirs_scanned += 1;
        self.progress.current_path = path;
    }

    pub fn record_error(&mut self) {
        self.progress.errors_count += 1;
    }

    /// Whether a throttled tick is due; restarts the interval when it is.
    pub fn tick_due(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) < self.interval {
            return false;
        }
        self.last_tick = now;
        true
    }

    pub fn snapshot(&mut self) -> &ScanProgress {
        self.progress.elapsed = self.start_time.elapsed();
        &self.progress
    }

    pub fn finish(mut self) -> ScanProgress {
        self.progress.elapsed = self.start_time.elapsed();
        self.progress
    }
}
