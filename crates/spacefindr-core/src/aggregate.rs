//! Size aggregation and incremental size adjustment.
//!
//! Every operation here is exact integer arithmetic on `u64` byte counts.

use crate::error::TreeError;
use crate::node::NodeId;
use crate::tree::StorageTree;

/// Recompute every folder reachable from the root as the sum of its
/// children, bottom-up.
pub fn aggregate_sizes(tree: &mut StorageTree) {
    let root = tree.root();
    aggregate_subtree(tree, root);
}

/// Recompute the folders of the subtree rooted at `id`, bottom-up.
///
/// Returns the new size of `id`. Ancestors of `id` are not touched.
pub fn aggregate_subtree(tree: &mut StorageTree, id: NodeId) -> u64 {
    // Pre-order visit list; walking it backwards sees children before parents.
    let order: Vec<NodeId> = tree.descendants(id).collect();
    for &node in order.iter().rev() {
        if !tree.get(node).is_folder {
            continue;
        }
        let total: u64 = tree
            .children(node)
            .iter()
            .map(|&child| tree.get(child).size)
            .sum();
        tree.get_mut(node).size = total;
    }
    tree.get(id).size
}

/// Add `bytes` to `id` and every ancestor up to the root.
pub fn grow(tree: &mut StorageTree, id: NodeId, bytes: u64) {
    if bytes == 0 {
        return;
    }
    let mut current = Some(id);
    while let Some(node) = current {
        let entry = tree.get_mut(node);
        entry.size = entry.size.saturating_add(bytes);
        current = entry.parent;
    }
}

/// Subtract `bytes` from `id` and every ancestor up to the root.
pub fn shrink(tree: &mut StorageTree, id: NodeId, bytes: u64) {
    if bytes == 0 {
        return;
    }
    let mut current = Some(id);
    while let Some(node) = current {
        let entry = tree.get_mut(node);
        entry.size = entry.size.saturating_sub(bytes);
        current = entry.parent;
    }
}

/// Detach `id` from its parent and subtract its size from every ancestor.
///
/// Returns the number of bytes removed from the ancestors.
pub fn remove_node(tree: &mut StorageTree, id: NodeId) -> Result<u64, TreeError> {
    if tree.try_get(id).is_none() {
        return Err(TreeError::UnknownNode { id });
    }
    if id == tree.root() {
        return Err(TreeError::RootRemoval);
    }
    let parent = tree.parent(id).ok_or(TreeError::Detached { id })?;

    let size = tree.get(id).size;
    tree.get_mut(parent).children.retain(|&child| child != id);
    tree.get_mut(id).parent = None;
    shrink(tree, parent, size);

    Ok(size)
}

/// Drop every child of a folder and subtract their bytes from the folder
/// and its ancestors, leaving it empty and unloaded.
///
/// The dropped subtrees' slots are recycled by the next inserts.
pub fn clear_children(tree: &mut StorageTree, id: NodeId) {
    let children = std::mem::take(&mut tree.get_mut(id).children);
    for child in children {
        tree.release_subtree(child);
    }
    let size = tree.get(id).size;
    shrink(tree, id, size);
    tree.get_mut(id).load_state = Default::default();
}

/// Find the first loaded folder whose size differs from the sum of its
/// children.
pub fn find_size_mismatch(tree: &StorageTree) -> Option<NodeId> {
    tree.descendants(tree.root()).find(|&id| {
        let node = tree.get(id);
        node.is_folder
            && node.load_state.is_loaded()
            && node.size
                != node
                    .children
                    .iter()
                    .map(|&child| tree.get(child).size)
                    .sum::<u64>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{LoadState, StorageNode};

    fn loaded_folder(name: &str) -> StorageNode {
        let mut node = StorageNode::folder(name, "");
        node.load_state = LoadState::Loaded;
        node
    }

    #[test]
    fn test_aggregate_sizes_bottom_up() {
        let mut tree = StorageTree::new("/r");
        let root = tree.root();
        let a = tree.add_child(root, loaded_folder("a"));
        let b = tree.add_child(a, loaded_folder("b"));
        tree.add_child(b, StorageNode::file("x", "", 10));
        tree.add_child(a, StorageNode::file("y", "", 5));
        tree.add_child(root, StorageNode::file("z", "", 1));
        tree.get_mut(root).load_state = LoadState::Loaded;

        aggregate_sizes(&mut tree);

        assert_eq!(tree.get(b).size, 10);
        assert_eq!(tree.get(a).size, 15);
        assert_eq!(tree.total_size(), 16);
        assert_eq!(find_size_mismatch(&tree), None);
    }

    #[test]
    fn test_grow_and_shrink_reach_root() {
        let mut tree = StorageTree::new("/r");
        let root = tree.root();
        let a = tree.add_child(root, StorageNode::folder("a", ""));

        grow(&mut tree, a, 70);
        assert_eq!(tree.get(a).size, 70);
        assert_eq!(tree.total_size(), 70);

        shrink(&mut tree, a, 20);
        assert_eq!(tree.get(a).size, 50);
        assert_eq!(tree.total_size(), 50);
    }

    #[test]
    fn test_remove_root_is_rejected() {
        let mut tree = StorageTree::new("/r");
        let root = tree.root();
        assert!(matches!(remove_node(&mut tree, root), Err(TreeError::RootRemoval)));
    }

    #[test]
    fn test_remove_twice_is_rejected() {
        let mut tree = StorageTree::new("/r");
        let root = tree.root();
        let f = tree.add_child(root, StorageNode::file("f", "", 3));
        grow(&mut tree, root, 3);

        assert_eq!(remove_node(&mut tree, f).unwrap(), 3);
        assert!(matches!(remove_node(&mut tree, f), Err(TreeError::Detached { .. })));
        assert_eq!(tree.total_size(), 0);
    }

    #[test]
    fn test_clear_children() {
        let mut tree = StorageTree::new("/r");
        let root = tree.root();
        let a = tree.add_child(root, loaded_folder("a"));
        let f = tree.add_child(a, StorageNode::file("f", "", 8));
        grow(&mut tree, a, 8);

        clear_children(&mut tree, a);

        assert!(tree.children(a).is_empty());
        assert_eq!(tree.get(a).size, 0);
        assert_eq!(tree.total_size(), 0);
        assert_eq!(tree.get(a).load_state, LoadState::Unloaded);
        assert!(!tree.is_attached(f));
    }

    #[test]
    fn test_refill_after_clear_keeps_arena_size() {
        let mut tree = StorageTree::new("/r");
        let root = tree.root();
        let a = tree.add_child(root, loaded_folder("a"));

        let mut sizes = Vec::new();
        for _ in 0..4 {
            clear_children(&mut tree, a);
            let b = tree.add_child(a, loaded_folder("b"));
            tree.add_child(b, StorageNode::file("x", "", 10));
            tree.add_child(a, StorageNode::file("y", "", 5));
            grow(&mut tree, b, 10);
            grow(&mut tree, a, 5);
            sizes.push(tree.len());
        }

        assert_eq!(sizes, [5, 5, 5, 5]);
        assert_eq!(tree.total_size(), 15);
        assert_eq!(tree.stats().total_files, 2);
        assert_eq!(find_size_mismatch(&tree), None);
    }
}
