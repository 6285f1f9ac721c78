//! Entry operations for spacefindr.
//!
//! Operations act on the file system first and update the
//! [`StorageTree`](spacefindr_core::StorageTree) only once the file system
//! change succeeded, so a failed operation never leaves the tree claiming
//! space that is still in use.

mod delete;

pub use delete::{DeleteError, delete_entry};
