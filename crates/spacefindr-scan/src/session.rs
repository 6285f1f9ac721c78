//! Background scanning with one in-flight scan per session.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use spacefindr_core::{ScanError, StorageTree};

use crate::progress::{ProgressKind, ProgressSink, ProgressUpdate, ScanProgress};
use crate::scanner::{ScanReport, Scanner};

/// Default channel buffer size for scan events.
pub const SCAN_CHANNEL_SIZE: usize = 8;

/// Events emitted by a background scan.
#[derive(Debug)]
pub enum ScanEvent {
    /// Throttled progress with a copy of the partial tree.
    Progress {
        progress: ScanProgress,
        snapshot: Box<StorageTree>,
    },
    /// The scan finished, was cancelled, or could not start.
    Complete(Result<(StorageTree, ScanReport), ScanError>),
}

/// Forwards throttled root reports into a channel.
struct ChannelSink {
    tx: mpsc::Sender<ScanEvent>,
}

impl ProgressSink for ChannelSink {
    fn report(&mut self, update: ProgressUpdate<'_>) {
        if update.kind != ProgressKind::Tick || self.tx.capacity() == 0 {
            return;
        }
        let event = ScanEvent::Progress {
            progress: update.progress.clone(),
            snapshot: Box::new(update.tree.clone()),
        };
        // A lagging consumer loses intermediate snapshots, never the walk.
        let _ = self.tx.try_send(event);
    }
}

/// Start a background scan of `path`.
///
/// Must be called from within a tokio runtime. The receiver yields
/// [`ScanEvent::Progress`] snapshots followed by exactly one
/// [`ScanEvent::Complete`].
pub fn start_scan(
    path: PathBuf,
    scanner: Scanner,
    cancel: CancellationToken,
) -> mpsc::Receiver<ScanEvent> {
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink { tx: tx.clone() };
        let result = scanner.scan(&path, &mut sink, &cancel);
        let _ = tx.blocking_send(ScanEvent::Complete(result));
    });

    rx
}

/// Owns the cancellation handle of the scan currently populating a view.
///
/// Starting a scan retires the previous one first, so two scans never feed
/// the same consumer concurrently. Dropping the session cancels its scan.
#[derive(Debug, Default)]
pub struct ScanSession {
    current: Option<CancellationToken>,
}

impl ScanSession {
    /// Create a session with no scan in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the in-flight scan, if any, and issue the token for the next.
    pub fn begin(&mut self) -> CancellationToken {
        self.cancel();
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        token
    }

    /// Cancel the in-flight scan, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            tracing::debug!("retiring in-flight scan");
            token.cancel();
        }
    }

    /// Whether a scan handle is outstanding and not cancelled.
    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Retire the previous scan and start a new background scan.
    pub fn start(&mut self, path: PathBuf, scanner: Scanner) -> mpsc::Receiver<ScanEvent> {
        let token = self.begin();
        start_scan(path, scanner, token)
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
