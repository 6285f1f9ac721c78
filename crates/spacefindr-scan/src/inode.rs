//! Directory identity tracking for link cycle detection.

use std::collections::HashSet;
use std::fs::Metadata;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Identity of a directory on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }

    /// Read the identity from metadata, where the platform exposes one.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        Some(Self::new(metadata.ino(), metadata.dev()))
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Tracks directories already entered during one walk.
///
/// When links are followed, a link pointing back at an ancestor would make
/// the walk loop forever. A directory is entered at most once per walk.
#[derive(Debug, Default)]
pub struct InodeTracker {
    seen: HashSet<InodeInfo>,
}

impl InodeTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a directory. Returns `true` if this is the first time seeing it.
    pub fn track(&mut self, info: InodeInfo) -> bool {
        self.seen.insert(info)
    }

    /// Check if a directory has been seen (without tracking).
    pub fn has_seen(&self, info: &InodeInfo) -> bool {
        self.seen.contains(info)
    }

    /// Get the number of directories tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
