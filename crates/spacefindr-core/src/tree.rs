//! Arena-backed storage tree and summary statistics.

use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::node::{NodeId, StorageNode};

/// Summary statistics for a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total size in bytes.
    pub total_size: u64,
    /// Number of files reachable from the root.
    pub total_files: u64,
    /// Number of folders reachable from the root, excluding the root.
    pub total_folders: u64,
    /// Deepest level reached (root = 0).
    pub max_depth: u32,
}

/// A scanned storage hierarchy stored as a flat arena of nodes.
///
/// The root owns its descendants through the `children` lists; parent links
/// are plain handles. Nodes removed with
/// [`remove_node`](crate::aggregate::remove_node) stay in their slot but are
/// no longer reachable from the root. Slots dropped by
/// [`clear_children`](crate::aggregate::clear_children) are recycled by later
/// inserts, so handles into a cleared subtree must not be kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageTree {
    nodes: Vec<StorageNode>,
    root: NodeId,
    #[serde(default)]
    free: Vec<NodeId>,
}

impl StorageTree {
    /// Create a tree holding a single unloaded root folder.
    ///
    /// The root is named after the last path segment, or the whole path when
    /// there is none (e.g. `/`).
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let root_path = root_path.into();
        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root_path.to_string_lossy().to_string());

        Self {
            nodes: vec![StorageNode::folder(name, root_path)],
            root: NodeId(0),
            free: Vec::new(),
        }
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this tree.
    pub fn get(&self, id: NodeId) -> &StorageNode {
        &self.nodes[id.index()]
    }

    /// Get a mutable node by handle.
    pub fn get_mut(&mut self, id: NodeId) -> &mut StorageNode {
        &mut self.nodes[id.index()]
    }

    /// Get a node if the handle belongs to this tree.
    pub fn try_get(&self, id: NodeId) -> Option<&StorageNode> {
        self.nodes.get(id.index())
    }

    /// Number of arena slots, detached and released ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Size of the root in bytes.
    pub fn total_size(&self) -> u64 {
        self.get(self.root).size
    }

    /// Append `node` under `parent`, deriving its full path from the parent.
    ///
    /// The parent's size is left alone; size bookkeeping belongs to
    /// [`aggregate`](crate::aggregate).
    pub fn add_child(&mut self, parent: NodeId, mut node: StorageNode) -> NodeId {
        node.parent = Some(parent);
        node.full_path = self.get(parent).full_path.join(node.name.as_str());
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot.index()] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() as u32 - 1)
            }
        };
        self.get_mut(parent).children.push(id);
        id
    }

    /// Hand every slot of the subtree under `id` back for reuse.
    ///
    /// `id` must already be detached from its parent.
    pub(crate) fn release_subtree(&mut self, id: NodeId) {
        let subtree: Vec<NodeId> = self.descendants(id).collect();
        for slot in subtree {
            let node = self.get_mut(slot);
            node.children.clear();
            node.parent = None;
            self.free.push(slot);
        }
    }

    /// Direct children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// Iterate from the immediate parent of `id` up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Handles from the root down to `id`, both included.
    pub fn breadcrumbs(&self, id: NodeId) -> Vec<NodeId> {
        let mut trail: Vec<NodeId> = self.ancestors(id).collect();
        trail.reverse();
        trail.push(id);
        trail
    }

    /// Whether `id` can be reached from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).last() == Some(self.root)
    }

    /// Resolve an absolute path to a node by walking down from the root.
    ///
    /// Returns `None` when the path is outside the root or not scanned yet.
    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        let root_path = &self.get(self.root).full_path;
        let relative = path.strip_prefix(root_path).ok()?;

        let mut current = self.root;
        for component in relative.components() {
            let Component::Normal(segment) = component else {
                continue;
            };
            let segment = segment.to_string_lossy();
            current = *self
                .children(current)
                .iter()
                .find(|&&child| self.get(child).name.as_str() == segment)?;
        }
        Some(current)
    }

    /// Count `(folders, files)` among the direct children of `id`.
    pub fn child_counts(&self, id: NodeId) -> (usize, usize) {
        let folders = self
            .children(id)
            .iter()
            .filter(|&&child| self.get(child).is_folder)
            .count();
        (folders, self.children(id).len() - folders)
    }

    /// Every node reachable from `id` (itself included), depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// The `limit` largest files reachable from the root, size descending.
    ///
    /// Ties keep scan order.
    pub fn largest_files(&self, limit: usize) -> Vec<NodeId> {
        let mut files: Vec<NodeId> = self
            .descendants(self.root)
            .filter(|&id| self.get(id).is_file())
            .collect();
        files.sort_by(|a, b| self.get(*b).size.cmp(&self.get(*a).size));
        files.truncate(limit);
        files
    }

    /// Compute summary statistics over the reachable tree.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            total_size: self.total_size(),
            ..TreeStats::default()
        };

        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, depth)) = stack.pop() {
            stats.max_depth = stats.max_depth.max(depth);
            let node = self.get(id);
            if node.is_file() {
                stats.total_files += 1;
                continue;
            }
            if id != self.root {
                stats.total_folders += 1;
            }
            stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
        }

        stats
    }

    /// Display name of a node.
    pub fn name(&self, id: NodeId) -> &CompactString {
        &self.get(id).name
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    tree: &'a StorageTree,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Depth-first iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a StorageTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (StorageTree, NodeId, NodeId) {
        let mut tree = StorageTree::new("/data");
        let root = tree.root();
        let docs = tree.add_child(root, StorageNode::folder("docs", ""));
        let report = tree.add_child(docs, StorageNode::file("report.pdf", "", 300));
        tree.add_child(root, StorageNode::file("notes.txt", "", 50));
        (tree, docs, report)
    }

    #[test]
    fn test_root_named_after_last_segment() {
        let tree = StorageTree::new("/home/user/media");
        assert_eq!(tree.name(tree.root()), "media");
        assert!(tree.is_empty());
    }

    #[test]
    fn test_root_without_segment_uses_full_path() {
        let tree = StorageTree::new("/");
        assert_eq!(tree.name(tree.root()), "/");
    }

    #[test]
    fn test_add_child_joins_paths() {
        let (tree, docs, report) = sample();
        assert_eq!(tree.get(docs).full_path, PathBuf::from("/data/docs"));
        assert_eq!(tree.get(report).full_path, PathBuf::from("/data/docs/report.pdf"));
        assert_eq!(tree.parent(report), Some(docs));
    }

    #[test]
    fn test_breadcrumbs() {
        let (tree, docs, report) = sample();
        assert_eq!(tree.breadcrumbs(report), vec![tree.root(), docs, report]);
        assert_eq!(tree.breadcrumbs(tree.root()), vec![tree.root()]);
    }

    #[test]
    fn test_find_by_path() {
        let (tree, docs, report) = sample();
        assert_eq!(tree.find_by_path(Path::new("/data")), Some(tree.root()));
        assert_eq!(tree.find_by_path(Path::new("/data/docs")), Some(docs));
        assert_eq!(tree.find_by_path(Path::new("/data/docs/report.pdf")), Some(report));
        assert_eq!(tree.find_by_path(Path::new("/data/missing")), None);
        assert_eq!(tree.find_by_path(Path::new("/elsewhere")), None);
    }

    #[test]
    fn test_child_counts_and_descendants() {
        let (tree, _, _) = sample();
        assert_eq!(tree.child_counts(tree.root()), (1, 1));
        let names: Vec<_> = tree
            .descendants(tree.root())
            .map(|id| tree.name(id).to_string())
            .collect();
        assert_eq!(names, ["data", "docs", "report.pdf", "notes.txt"]);
    }

    #[test]
    fn test_released_slots_are_reused() {
        let (mut tree, docs, _) = sample();
        let root = tree.root();
        let slots = tree.len();
        tree.get_mut(root).children.retain(|&child| child != docs);
        tree.release_subtree(docs);

        let music = tree.add_child(root, StorageNode::folder("music", ""));
        let song = tree.add_child(music, StorageNode::file("song.ogg", "", 4));
        tree.add_child(music, StorageNode::file("extra.ogg", "", 1));

        assert_eq!(tree.len(), slots + 1);
        assert!(tree.is_attached(song));
        assert_eq!(tree.get(song).full_path, PathBuf::from("/data/music/song.ogg"));
        assert_eq!(tree.child_counts(root), (1, 1));
        assert!(!tree.is_empty());
    }
}
