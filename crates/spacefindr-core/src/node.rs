//! File and folder node types.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Handle of a node inside a [`StorageTree`](crate::StorageTree) arena.
///
/// Handles are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw index.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How far a folder's children have been materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    /// Children have never been enumerated.
    #[default]
    Unloaded,
    /// Enumeration started but was interrupted or is still running.
    Partial,
    /// Every surviving child has been added.
    Loaded,
}

impl LoadState {
    /// Check if the children are fully materialized.
    pub fn is_loaded(self) -> bool {
        matches!(self, LoadState::Loaded)
    }
}

/// A single file or folder in the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageNode {
    /// Display name (last path segment).
    pub name: CompactString,

    /// Absolute path of the entry.
    pub full_path: PathBuf,

    /// Size in bytes (sum of surviving children for folders).
    pub size: u64,

    /// Whether this node is a folder.
    pub is_folder: bool,

    /// Child handles in insertion order (folders only).
    pub children: Vec<NodeId>,

    /// Containing folder, `None` for a root or a detached node.
    pub parent: Option<NodeId>,

    /// Materialization state of `children`.
    pub load_state: LoadState,
}

impl StorageNode {
    /// Create a file node.
    pub fn file(name: impl Into<CompactString>, full_path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            size,
            is_folder: false,
            children: Vec::new(),
            parent: None,
            load_state: LoadState::Loaded,
        }
    }

    /// Create an empty, unloaded folder node.
    pub fn folder(name: impl Into<CompactString>, full_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            size: 0,
            is_folder: true,
            children: Vec::new(),
            parent: None,
            load_state: LoadState::Unloaded,
        }
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        !self.is_folder
    }

    /// Check if this folder's children are fully materialized.
    ///
    /// Always `true` for files.
    pub fn is_loaded(&self) -> bool {
        !self.is_folder || self.load_state.is_loaded()
    }
}
