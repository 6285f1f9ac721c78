//! Entry attributes and the pluggable filtering policy.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use globset::{Glob, GlobSet, GlobSetBuilder};

use spacefindr_core::{FilterPolicy, ScanConfig, ScanError};

use crate::inode::InodeInfo;

/// Extensions used by cloud-sync clients for placeholder files.
const CLOUD_PLACEHOLDER_EXTENSIONS: &[&str] = &["nextcloud", "cloud", "cloudf"];

#[cfg(windows)]
mod attributes {
    pub const TEMPORARY: u32 = 0x0000_0100;
    pub const SPARSE_FILE: u32 = 0x0000_0200;
    pub const REPARSE_POINT: u32 = 0x0000_0400;
    pub const OFFLINE: u32 = 0x0000_1000;
}

/// Metadata of a directory entry, as seen by an [`EntryFilter`].
#[derive(Debug, Clone)]
pub struct EntryAttributes {
    /// Entry name.
    pub name: CompactString,
    /// Entry path.
    pub path: PathBuf,
    /// Whether the entry (or its link target) is a directory.
    pub is_dir: bool,
    /// Symbolic link, junction or other reparse point.
    pub is_reparse_point: bool,
    /// Length in bytes (of the link target for followed links).
    pub len: u64,
    /// Data not immediately available (moved to offline storage).
    pub is_offline: bool,
    /// Marked as temporary storage.
    pub is_temporary: bool,
    /// Sparse file.
    pub is_sparse: bool,
    /// On-disk identity of the entry (of the link target for followed links).
    pub inode: Option<InodeInfo>,
}

impl EntryAttributes {
    /// Read the attributes of `path`.
    ///
    /// Links are inspected first and then resolved, so a broken link is an
    /// error here.
    pub fn inspect(path: &Path) -> io::Result<Self> {
        let link_metadata = fs::symlink_metadata(path)?;
        let is_reparse_point = is_reparse_point(&link_metadata);
        let metadata = if link_metadata.file_type().is_symlink() {
            fs::metadata(path)?
        } else {
            link_metadata
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let (is_offline, is_temporary, is_sparse) = platform_flags(&metadata);

        Ok(Self {
            name: name.into(),
            path: path.to_path_buf(),
            is_dir: metadata.is_dir(),
            is_reparse_point,
            len: metadata.len(),
            is_offline,
            is_temporary,
            is_sparse,
            inode: InodeInfo::from_metadata(&metadata),
        })
    }

    /// Lower-cased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(self.name.as_str())
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

#[cfg(windows)]
fn is_reparse_point(metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    metadata.file_type().is_symlink()
        || metadata.file_attributes() & attributes::REPARSE_POINT != 0
}

#[cfg(not(windows))]
fn is_reparse_point(metadata: &Metadata) -> bool {
    metadata.file_type().is_symlink()
}

#[cfg(windows)]
fn platform_flags(metadata: &Metadata) -> (bool, bool, bool) {
    use std::os::windows::fs::MetadataExt;
    let attrs = metadata.file_attributes();
    (
        attrs & attributes::OFFLINE != 0,
        attrs & attributes::TEMPORARY != 0,
        attrs & attributes::SPARSE_FILE != 0,
    )
}

#[cfg(not(windows))]
fn platform_flags(_metadata: &Metadata) -> (bool, bool, bool) {
    (false, false, false)
}

/// Decides which enumerated entries become nodes.
///
/// Entries whose attributes cannot be read never reach the filter; the
/// scanner excludes them on its own.
pub trait EntryFilter: Send + Sync {
    /// Whether a directory is left out (and not descended into).
    fn skip_dir(&self, entry: &EntryAttributes) -> bool;

    /// Whether a file is left out.
    fn skip_file(&self, entry: &EntryAttributes) -> bool;
}

/// The built-in filter driven by [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct PolicyFilter {
    policy: FilterPolicy,
    ignore_reparse_points: bool,
    ignore: GlobSet,
}

impl PolicyFilter {
    /// Build the filter for a configuration, compiling its ignore patterns.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("bad ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self {
            policy: config.filter_policy,
            ignore_reparse_points: config.ignore_reparse_points,
            ignore,
        })
    }

    fn is_ignored(&self, entry: &EntryAttributes) -> bool {
        self.ignore.is_match(entry.name.as_str())
    }

    fn is_cloud_placeholder(entry: &EntryAttributes) -> bool {
        entry.is_offline
            || entry.is_temporary
            || entry.is_sparse
            || entry
                .extension()
                .is_some_and(|ext| CLOUD_PLACEHOLDER_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl Default for PolicyFilter {
    fn default() -> Self {
        Self {
            policy: FilterPolicy::Standard,
            ignore_reparse_points: true,
            ignore: GlobSet::empty(),
        }
    }
}

impl EntryFilter for PolicyFilter {
    fn skip_dir(&self, entry: &EntryAttributes) -> bool {
        (self.ignore_reparse_points && entry.is_reparse_point) || self.is_ignored(entry)
    }

    fn skip_file(&self, entry: &EntryAttributes) -> bool {
        if self.ignore_reparse_points && entry.is_reparse_point {
            return true;
        }
        if entry.len == 0 || self.is_ignored(entry) {
            return true;
        }
        match self.policy {
            FilterPolicy::Standard => false,
            FilterPolicy::CloudPlaceholders => Self::is_cloud_placeholder(entry),
        }
    }
}
