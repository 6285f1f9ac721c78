//! Depth-first directory scanner.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use tokio_util::sync::CancellationToken;

use spacefindr_core::aggregate::{clear_children, grow};
use spacefindr_core::{
    LoadState, NodeId, ScanConfig, ScanError, ScanWarning, StorageNode, StorageTree,
};

use crate::filter::{EntryAttributes, EntryFilter, PolicyFilter};
use crate::inode::{InodeInfo, InodeTracker};
use crate::progress::{
    NoProgress, ProgressKind, ProgressSink, ProgressTracker, ProgressUpdate, ScanProgress,
};

/// Outcome of a scan or a lazy load.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Final counters.
    pub progress: ScanProgress,
    /// Problems recovered during the walk.
    pub warnings: Vec<ScanWarning>,
    /// Whether the walk stopped because its token was cancelled.
    pub cancelled: bool,
}

impl ScanReport {
    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn cancelled_before_start() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }
}

/// Builds and refreshes [`StorageTree`]s from the file system.
///
/// Scanning is single-threaded and blocking; run it off any interactive
/// thread (see [`start_scan`](crate::start_scan)).
#[derive(Clone)]
pub struct Scanner {
    config: ScanConfig,
    filter: Arc<dyn EntryFilter>,
}

impl Scanner {
    /// Create a scanner using the built-in [`PolicyFilter`].
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let filter = PolicyFilter::from_config(&config)?;
        Ok(Self::with_filter(config, filter))
    }

    /// Create a scanner with a custom filtering policy.
    pub fn with_filter(config: ScanConfig, filter: impl EntryFilter + 'static) -> Self {
        Self {
            config,
            filter: Arc::new(filter),
        }
    }

    /// The configuration this scanner was built with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `path` into a new tree whose root is named after its last segment.
    ///
    /// Only an unusable root is an error; everything that goes wrong below
    /// it is recovered and listed in the report.
    pub fn scan(
        &self,
        path: &Path,
        sink: &mut impl ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(StorageTree, ScanReport), ScanError> {
        let root_path = dunce::canonicalize(path).map_err(|e| ScanError::io(path, e))?;
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let mut tree = StorageTree::new(&root_path);
        let root = tree.root();
        let report = self.scan_into(&mut tree, root, sink, cancel);
        Ok((tree, report))
    }

    /// Populate an existing folder node in place, walking its whole subtree.
    ///
    /// Children the node already had are discarded first and their bytes
    /// removed from its ancestors. Files are left untouched.
    pub fn scan_into(
        &self,
        tree: &mut StorageTree,
        node: NodeId,
        sink: &mut impl ProgressSink,
        cancel: &CancellationToken,
    ) -> ScanReport {
        if cancel.is_cancelled() {
            return ScanReport::cancelled_before_start();
        }
        if !tree.get(node).is_folder {
            return ScanReport::default();
        }

        tracing::info!(path = %tree.get(node).full_path.display(), "scan started");

        clear_children(tree, node);
        let mut walk = Walk::new(self, node, sink, cancel, WalkDepth::Full);
        walk.enter_root(tree, node);
        walk.walk_dir(tree, node);
        let report = walk.finish();

        tracing::info!(
            files = report.progress.files_scanned,
            dirs = report.progress.dirs_scanned,
            bytes = report.progress.bytes_scanned,
            warnings = report.warnings.len(),
            cancelled = report.cancelled,
            "scan finished"
        );
        report
    }

    /// Populate only the immediate children of a folder that is not loaded.
    ///
    /// Child folders are added unloaded with size 0. Returns `None` without
    /// touching the tree when `node` is a file or already loaded.
    pub fn load_children(&self, tree: &mut StorageTree, node: NodeId) -> Option<ScanReport> {
        let entry = tree.get(node);
        if !entry.is_folder || entry.load_state.is_loaded() {
            return None;
        }

        clear_children(tree, node);
        let cancel = CancellationToken::new();
        let mut sink = NoProgress;
        let mut walk = Walk::new(self, node, &mut sink, &cancel, WalkDepth::OneLevel);
        walk.walk_dir(tree, node);
        Some(walk.finish())
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkDepth {
    Full,
    OneLevel,
}

/// Immediate children of one directory, split by kind.
#[derive(Debug, Default)]
struct Listing {
    dirs: Vec<EntryAttributes>,
    files: Vec<EntryAttributes>,
}

/// State of one walk.
struct Walk<'a, S> {
    filter: &'a dyn EntryFilter,
    scan_root: NodeId,
    sink: &'a mut S,
    cancel: &'a CancellationToken,
    depth: WalkDepth,
    tracker: ProgressTracker,
    visited: InodeTracker,
    warnings: Vec<ScanWarning>,
    cancelled: bool,
}

impl<'a, S: ProgressSink> Walk<'a, S> {
    fn new(
        scanner: &'a Scanner,
        scan_root: NodeId,
        sink: &'a mut S,
        cancel: &'a CancellationToken,
        depth: WalkDepth,
    ) -> Self {
        Self {
            filter: scanner.filter.as_ref(),
            scan_root,
            sink,
            cancel,
            depth,
            tracker: ProgressTracker::new(scanner.config.progress_interval()),
            visited: InodeTracker::new(),
            warnings: Vec::new(),
            cancelled: false,
        }
    }

    /// Mark the scan root as visited so links back to it are not followed.
    fn enter_root(&mut self, tree: &StorageTree, node: NodeId) {
        if let Some(info) = std::fs::metadata(&tree.get(node).full_path)
            .ok()
            .and_then(|m| InodeInfo::from_metadata(&m))
        {
            self.visited.track(info);
        }
    }

    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled && self.cancel.is_cancelled() {
            tracing::debug!("scan cancelled");
            self.cancelled = true;
        }
        self.cancelled
    }

    fn walk_dir(&mut self, tree: &mut StorageTree, dir: NodeId) {
        if self.is_cancelled() {
            return;
        }

        let dir_path = tree.get(dir).full_path.clone();
        self.tracker.record_dir(dir_path.clone());
        tree.get_mut(dir).load_state = LoadState::Partial;

        let listing = match self.read_listing(&dir_path) {
            Ok(listing) => listing,
            Err(err) => {
                tracing::debug!(path = %dir_path.display(), error = %err, "cannot enumerate directory");
                self.warnings.push(ScanWarning::read_error(&dir_path, &err));
                self.tracker.record_error();
                Listing::default()
            }
        };

        for entry in listing.dirs {
            if self.is_cancelled() {
                break;
            }
            if self.filter.skip_dir(&entry) {
                tracing::debug!(path = %entry.path.display(), "skipping directory");
                continue;
            }
            if self.depth == WalkDepth::Full && !self.first_visit(&entry) {
                tracing::debug!(path = %entry.path.display(), "directory already visited");
                self.warnings.push(ScanWarning::cycle(&entry.path));
                continue;
            }

            let child = tree.add_child(dir, StorageNode::folder(entry.name, entry.path));
            if self.depth == WalkDepth::Full {
                self.walk_dir(tree, child);
            }
            self.maybe_tick(tree);
        }

        for entry in listing.files {
            if self.is_cancelled() {
                break;
            }
            if self.filter.skip_file(&entry) {
                continue;
            }

            let size = entry.len;
            tree.add_child(dir, StorageNode::file(entry.name, entry.path, size));
            grow(tree, dir, size);
            self.tracker.record_file(size);
            self.maybe_tick(tree);
        }

        if self.cancelled {
            return;
        }
        tree.get_mut(dir).load_state = LoadState::Loaded;

        let update = ProgressUpdate {
            tree,
            node: dir,
            kind: ProgressKind::DirectoryComplete,
            progress: self.tracker.snapshot(),
        };
        self.sink.report(update);
    }

    /// Record a directory as entered; `false` if it was entered before.
    fn first_visit(&mut self, entry: &EntryAttributes) -> bool {
        match entry.inode {
            Some(info) => self.visited.track(info),
            None => true,
        }
    }

    fn maybe_tick(&mut self, tree: &StorageTree) {
        if !self.tracker.tick_due() {
            return;
        }
        let update = ProgressUpdate {
            tree,
            node: self.scan_root,
            kind: ProgressKind::Tick,
            progress: self.tracker.snapshot(),
        };
        self.sink.report(update);
    }

    /// Enumerate the immediate children of `dir`.
    ///
    /// Entries whose attributes cannot be read are dropped with a warning.
    fn read_listing(&mut self, dir: &Path) -> io::Result<Listing> {
        let walker = WalkDir::new(dir)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .min_depth(0)
            .max_depth(1);

        let mut listing = Listing::default();
        for entry_result in walker {
            let mut entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf);
                    let failed_dir =
                        err.depth() == 0 || path.as_deref().is_none_or(|p| p == dir);
                    let err = into_io_error(err);
                    if failed_dir {
                        return Err(err);
                    }
                    let path = path.unwrap_or_default();
                    self.warnings.push(ScanWarning::metadata_error(&path, &err));
                    self.tracker.record_error();
                    continue;
                }
            };
            if entry.depth() == 0 {
                if let Some(err) = entry.read_children_error.take() {
                    return Err(into_io_error(err));
                }
                continue;
            }

            let path: PathBuf = entry.path();
            match EntryAttributes::inspect(&path) {
                Ok(attrs) if attrs.is_dir => listing.dirs.push(attrs),
                Ok(attrs) => listing.files.push(attrs),
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "cannot read attributes");
                    self.warnings.push(ScanWarning::metadata_error(&path, &err));
                    self.tracker.record_error();
                }
            }
        }
        Ok(listing)
    }

    fn finish(self) -> ScanReport {
        ScanReport {
            progress: self.tracker.finish(),
            warnings: self.warnings,
            cancelled: self.cancelled,
        }
    }
}

fn into_io_error(err: jwalk::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error().unwrap_or_else(|| io::Error::other(message))
}
