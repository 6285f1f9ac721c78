//! File system scanning engine for spacefindr.
//!
//! This crate walks a directory tree depth-first and builds the
//! [`StorageTree`] consumed by the layout engine.
//!
//! # Overview
//!
//! - **Incremental**: sizes are rolled up the ancestor chain as entries are
//!   added, so a partial tree is always internally consistent
//! - **Filtered** through a pluggable [`EntryFilter`]
//! - **Throttled progress** via a [`ProgressSink`]
//! - **Cancellable** at every directory and entry via a `CancellationToken`
//! - **Lazy** one-level loading for drill-down with [`Scanner::load_children`]
//!
//! # Example
//!
//! ```rust,no_run
//! use spacefindr_scan::{NoProgress, ScanConfig, Scanner};
//! use tokio_util::sync::CancellationToken;
//!
//! let scanner = Scanner::new(ScanConfig::default()).unwrap();
//! let (tree, report) = scanner
//!     .scan("/path/to/scan".as_ref(), &mut NoProgress, &CancellationToken::new())
//!     .unwrap();
//!
//! println!("Total size: {} bytes", tree.total_size());
//! println!("Total files: {}", report.progress.files_scanned);
//! ```
//!
//! # Background scans
//!
//! ```rust,no_run
//! use spacefindr_scan::{ScanConfig, ScanEvent, ScanSession, Scanner};
//!
//! # async fn run() {
//! let mut session = ScanSession::new();
//! let scanner = Scanner::new(ScanConfig::default()).unwrap();
//! let mut events = session.start("/path/to/scan".into(), scanner);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ScanEvent::Progress { progress, .. } => println!("{} files", progress.files_scanned),
//!         ScanEvent::Complete(result) => { let _ = result; break; }
//!     }
//! }
//! # }
//! ```

mod filter;
mod inode;
mod progress;
mod scanner;
mod session;

pub use filter::{EntryAttributes, EntryFilter, PolicyFilter};
pub use inode::{InodeInfo, InodeTracker};
pub use progress::{NoProgress, ProgressKind, ProgressSink, ProgressUpdate, ScanProgress};
pub use scanner::{ScanReport, Scanner};
pub use session::{SCAN_CHANNEL_SIZE, ScanEvent, ScanSession, start_scan};

// Re-export core types for convenience
pub use spacefindr_core::{
    FilterPolicy, LoadState, NodeId, ScanConfig, ScanError, ScanWarning, StorageNode,
    StorageTree, WarningKind,
};
