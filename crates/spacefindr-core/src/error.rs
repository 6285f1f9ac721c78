//! Error types for scanning and tree mutation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::NodeId;

/// Errors that abort a scan before it starts.
///
/// Failures inside the walk are recovered and reported as [`ScanWarning`]s.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised by structural tree mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The root has no parent to be detached from.
    #[error("The root node cannot be removed")]
    RootRemoval,

    /// The node was already detached from the tree.
    #[error("Node {id:?} is not attached to a parent")]
    Detached { id: NodeId },

    /// The handle was not issued by this tree.
    #[error("Node {id:?} does not belong to this tree")]
    UnknownNode { id: NodeId },
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error enumerating a directory.
    ReadError,
    /// Error reading an entry's metadata.
    MetadataError,
    /// Directory already visited through a followed link.
    Cycle,
}

/// Non-fatal problem recovered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a warning for a directory that could not be enumerated.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = if error.kind() == std::io::ErrorKind::PermissionDenied {
            WarningKind::PermissionDenied
        } else {
            WarningKind::ReadError
        };
        Self {
            message: format!("Read error: {error}"),
            path,
            kind,
        }
    }

    /// Create a warning for an entry whose attributes could not be read.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            message: format!("Metadata error: {error}"),
            path: path.into(),
            kind: WarningKind::MetadataError,
        }
    }

    /// Create a warning for a directory reached twice through links.
    pub fn cycle(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Already visited: {}", path.display()),
            path,
            kind: WarningKind::Cycle,
        }
    }
}
