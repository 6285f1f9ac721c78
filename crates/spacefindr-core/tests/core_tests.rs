use spacefindr_core::aggregate::grow;
use spacefindr_core::{
    LoadState, NodeId, StorageNode, StorageTree, TreeError, aggregate_sizes, find_size_mismatch,
    remove_node,
};
use std::path::Path;

fn loaded(mut node: StorageNode) -> StorageNode {
    node.load_state = LoadState::Loaded;
    node
}

/// root(600) -> A(600) -> { f(200), g(400) }
fn three_level_tree() -> (StorageTree, NodeId, NodeId) {
    let mut tree = StorageTree::new("/vol");
    let root = tree.root();
    tree.get_mut(root).load_state = LoadState::Loaded;
    let a = tree.add_child(root, loaded(StorageNode::folder("A", "")));
    let f = tree.add_child(a, StorageNode::file("f", "", 200));
    tree.add_child(a, StorageNode::file("g", "", 400));
    aggregate_sizes(&mut tree);
    (tree, a, f)
}

#[test]
fn test_remove_leaf_updates_every_ancestor() {
    let (mut tree, a, f) = three_level_tree();
    assert_eq!(tree.get(a).size, 600);
    assert_eq!(tree.total_size(), 600);

    let removed = remove_node(&mut tree, f).unwrap();

    assert_eq!(removed, 200);
    assert_eq!(tree.get(a).size, 400);
    assert_eq!(tree.total_size(), 400);
    assert!(!tree.children(a).contains(&f));
    assert!(!tree.is_attached(f));
    assert_eq!(find_size_mismatch(&tree), None);
}

#[test]
fn test_remove_folder_subtracts_whole_subtree() {
    let (mut tree, a, _) = three_level_tree();
    let root = tree.root();

    remove_node(&mut tree, a).unwrap();

    assert_eq!(tree.total_size(), 0);
    assert!(tree.children(root).is_empty());
}

#[test]
fn test_remove_rejects_root_and_foreign_handles() {
    let (mut tree, _, _) = three_level_tree();
    let root = tree.root();

    assert_eq!(remove_node(&mut tree, root), Err(TreeError::RootRemoval));
    assert_eq!(
        remove_node(&mut tree, NodeId::new(999)),
        Err(TreeError::UnknownNode { id: NodeId::new(999) })
    );
    assert_eq!(tree.total_size(), 600);
}

#[test]
fn test_mismatch_detected_only_for_loaded_folders() {
    let mut tree = StorageTree::new("/vol");
    let root = tree.root();
    let partial = tree.add_child(root, StorageNode::folder("partial", ""));
    tree.add_child(partial, StorageNode::file("x", "", 10));

    // Unloaded folders are allowed to lag behind their children.
    assert_eq!(find_size_mismatch(&tree), None);

    tree.get_mut(partial).load_state = LoadState::Loaded;
    assert_eq!(find_size_mismatch(&tree), Some(partial));

    grow(&mut tree, partial, 10);
    assert_eq!(find_size_mismatch(&tree), None);
}

#[test]
fn test_largest_files_across_folders() {
    let mut tree = StorageTree::new("/vol");
    let root = tree.root();
    let a = tree.add_child(root, StorageNode::folder("a", ""));
    let b = tree.add_child(a, StorageNode::folder("b", ""));
    let small = tree.add_child(root, StorageNode::file("small", "", 1));
    let big = tree.add_child(b, StorageNode::file("big", "", 900));
    let mid = tree.add_child(a, StorageNode::file("mid", "", 50));

    assert_eq!(tree.largest_files(2), vec![big, mid]);
    assert_eq!(tree.largest_files(10), vec![big, mid, small]);
    assert_eq!(
        tree.get(big).full_path,
        Path::new("/vol/a/b/big").to_path_buf()
    );
}

#[test]
fn test_stats_count_reachable_nodes() {
    let (mut tree, _, f) = three_level_tree();

    let stats = tree.stats();
    assert_eq!(stats.total_size, 600);
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_folders, 1);
    assert_eq!(stats.max_depth, 2);

    remove_node(&mut tree, f).unwrap();
    assert_eq!(tree.stats().total_files, 1);
}

#[test]
fn test_empty_loaded_folder_is_distinct_from_unloaded() {
    let mut tree = StorageTree::new("/vol");
    let root = tree.root();
    let empty = tree.add_child(root, loaded(StorageNode::folder("empty", "")));
    let unknown = tree.add_child(root, StorageNode::folder("unknown", ""));

    assert!(tree.get(empty).is_loaded());
    assert!(!tree.get(unknown).is_loaded());
    assert_eq!(tree.child_counts(root), (2, 0));
}
