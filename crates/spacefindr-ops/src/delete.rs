//! Deleting scanned entries.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use spacefindr_core::{NodeId, StorageTree, TreeError, remove_node};

/// Errors from [`delete_entry`].
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The scan root is never deleted.
    #[error("Refusing to delete the scan root: {path}")]
    Root { path: PathBuf },

    /// The file system refused the deletion; the tree was left unchanged.
    #[error("Failed to delete {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The handle does not name a live entry of the tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl DeleteError {
    /// Path of the entry the error is about, if known.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Root { path } | Self::Io { path, .. } => Some(path),
            Self::Tree(_) => None,
        }
    }
}

/// Delete an entry from disk, then drop it from the tree.
///
/// Folders are removed recursively. Returns the bytes subtracted from every
/// ancestor. On error the tree is unchanged.
pub fn delete_entry(tree: &mut StorageTree, node: NodeId) -> Result<u64, DeleteError> {
    let Some(entry) = tree.try_get(node) else {
        return Err(TreeError::UnknownNode { id: node }.into());
    };
    if node == tree.root() {
        return Err(DeleteError::Root {
            path: entry.full_path.clone(),
        });
    }
    if !tree.is_attached(node) {
        return Err(TreeError::Detached { id: node }.into());
    }

    let path = entry.full_path.clone();
    let result = if entry.is_folder {
        fs::remove_dir_all(&path)
    } else {
        fs::remove_file(&path)
    };
    if let Err(source) = result {
        tracing::warn!(path = %path.display(), error = %source, "delete failed");
        return Err(DeleteError::Io { path, source });
    }

    let freed = remove_node(tree, node)?;
    tracing::info!(path = %path.display(), bytes = freed, "deleted entry");
    Ok(freed)
}
