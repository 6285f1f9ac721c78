//! Core types for spacefindr.
//!
//! This crate provides the storage tree model shared by the scanner, the
//! layout engine and the entry operations: an arena of [`StorageNode`]s with
//! non-owning parent handles, the size aggregator, and scan configuration.

pub mod aggregate;
mod config;
mod error;
mod node;
mod tree;

pub use aggregate::{aggregate_sizes, find_size_mismatch, remove_node};
pub use config::{DEFAULT_PROGRESS_INTERVAL_MS, FilterPolicy, ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, TreeError, WarningKind};
pub use node::{LoadState, NodeId, StorageNode};
pub use tree::{Ancestors, Descendants, StorageTree, TreeStats};
