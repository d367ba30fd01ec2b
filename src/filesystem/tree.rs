use std::collections::HashMap;

use snafu::Snafu;
use tracing::debug;

use super::{FileData, FolderId, Node, NodeId};

const ROOT_NAME: &str = "/";

/// Arena holding every node known to a file manager, attached or not.
///
/// Folders own the ids of their children, children only point back at their
/// parent. All mutating operations validate first and only then touch the
/// arena, so a returned error always means nothing changed.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: HashMap<NodeId, Node>,
    root: FolderId,
    next_id: u64,
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    pub fn new() -> Self {
        let mut tree = FileTree {
            nodes: HashMap::new(),
            root: FolderId::new(NodeId::from(0)),
            next_id: 0,
        };
        tree.root = FolderId::new(tree.allocate(Node::folder(ROOT_NAME)));
        tree
    }

    pub fn root(&self) -> FolderId {
        self.root
    }

    /// Number of nodes in the arena, the root and detached nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::UnknownNode { id })
    }

    /// Checked conversion of a plain id into a folder id.
    pub fn folder(&self, id: NodeId) -> Result<FolderId, TreeError> {
        if self.get(id)?.is_folder() {
            Ok(FolderId::new(id))
        } else {
            Err(TreeError::NotAFolder { id })
        }
    }

    pub fn create_folder(&mut self, name: impl Into<String>) -> FolderId {
        FolderId::new(self.allocate(Node::folder(name)))
    }

    pub fn create_file(&mut self, name: impl Into<String>, data: FileData) -> NodeId {
        self.allocate(Node::file(name, data))
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<FolderId>, TreeError> {
        Ok(self.get(id)?.parent())
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        Ok(self.get(id)?.children())
    }

    /// Attaches a detached node as the last child of `parent`.
    pub fn attach(&mut self, parent: FolderId, child: NodeId) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        if let Some(current) = self.get(child)?.parent() {
            return Err(TreeError::AlreadyAttached {
                id: child,
                parent: current,
            });
        }

        self.link(parent, child)?;
        debug!("Attached {} under {}", child, parent);
        Ok(())
    }

    /// Detaches `child` from its parent and returns the former parent.
    pub fn detach(&mut self, child: NodeId) -> Result<FolderId, TreeError> {
        let parent = self.attached_parent(child)?;
        self.unlink(parent, child)?;
        debug!("Detached {} from {}", child, parent);
        Ok(parent)
    }

    /// Moves an attached node under `new_parent` and returns the old parent.
    ///
    /// Relocating a node into the folder that already holds it leaves the
    /// tree untouched.
    pub fn relocate(
        &mut self,
        child: NodeId,
        new_parent: FolderId,
    ) -> Result<FolderId, TreeError> {
        let old_parent = self.attached_parent(child)?;
        if old_parent == new_parent {
            return Ok(old_parent);
        }
        self.check_attachable(new_parent, child)?;

        self.unlink(old_parent, child)?;
        self.link(new_parent, child)?;
        debug!("Moved {} from {} to {}", child, old_parent, new_parent);
        Ok(old_parent)
    }

    /// Drops a detached node and everything below it from the arena.
    ///
    /// Returns the ids that were removed, the purged node first.
    pub fn purge(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if id == self.root.id() {
            return Err(TreeError::RootIsFixed);
        }
        if let Some(parent) = self.get(id)?.parent() {
            return Err(TreeError::StillAttached { id, parent });
        }

        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                pending.extend(node.children().iter().rev());
                removed.push(current);
            }
        }
        debug!("Purged {} nodes starting at {}", removed.len(), id);
        Ok(removed)
    }

    /// Slash separated path of `id`.
    ///
    /// Attached nodes render from the root (`/docs/a.txt`), nodes in a detached
    /// subtree render relative to its top (`drafts/a.txt`).
    pub fn path(&self, id: NodeId) -> Result<String, TreeError> {
        let mut names = Vec::new();
        let mut current = id;
        loop {
            let node = self.get(current)?;
            match node.parent() {
                Some(parent) => {
                    names.push(node.name());
                    current = parent.id();
                }
                None if current == self.root.id() => {
                    names.reverse();
                    return Ok(format!("{ROOT_NAME}{}", names.join("/")));
                }
                None => {
                    names.push(node.name());
                    names.reverse();
                    return Ok(names.join("/"));
                }
            }
            if names.len() > self.nodes.len() {
                return Err(TreeError::WouldCycle { id, target: current });
            }
        }
    }

    /// Looks up an absolute path such as `/docs/a.txt`.
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        let relative = path.strip_prefix(ROOT_NAME)?;
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root.id(), |current, segment| {
                self.child_named(current, segment)
            })
    }

    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.get(&parent)?.children().iter().copied().find(|child| {
            self.nodes
                .get(child)
                .is_some_and(|node| node.name() == name)
        })
    }

    /// Whether `ancestor` appears on the parent chain of `id` (or is `id`).
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            if steps > self.nodes.len() {
                return false;
            }
            steps += 1;
            current = self
                .nodes
                .get(&node)
                .and_then(|n| n.parent())
                .map(FolderId::id);
        }
        false
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        let id = NodeId::from(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn attached_parent(&self, child: NodeId) -> Result<FolderId, TreeError> {
        if child == self.root.id() {
            return Err(TreeError::RootIsFixed);
        }
        self.get(child)?
            .parent()
            .ok_or(TreeError::NotAttached { id: child })
    }

    /// Checks everything except the child's current parent link.
    fn check_attachable(&self, parent: FolderId, child: NodeId) -> Result<(), TreeError> {
        let target = self.get(parent.id())?;
        let node = self.get(child)?;
        if child == self.root.id() {
            return Err(TreeError::RootIsFixed);
        }
        if self.is_within(parent.id(), child) {
            return Err(TreeError::WouldCycle {
                id: child,
                target: parent.id(),
            });
        }
        if target.children().iter().any(|sibling| {
            self.nodes
                .get(sibling)
                .is_some_and(|s| s.name() == node.name())
        }) {
            return Err(TreeError::NameTaken {
                parent,
                name: node.name().to_string(),
            });
        }
        Ok(())
    }

    fn link(&mut self, parent: FolderId, child: NodeId) -> Result<(), TreeError> {
        self.nodes
            .get_mut(&parent.id())
            .and_then(Node::children_mut)
            .ok_or(TreeError::NotAFolder { id: parent.id() })?
            .push(child);
        self.nodes
            .get_mut(&child)
            .ok_or(TreeError::UnknownNode { id: child })?
            .set_parent(Some(parent));
        Ok(())
    }

    fn unlink(&mut self, parent: FolderId, child: NodeId) -> Result<(), TreeError> {
        self.nodes
            .get_mut(&parent.id())
            .and_then(Node::children_mut)
            .ok_or(TreeError::NotAFolder { id: parent.id() })?
            .retain(|id| *id != child);
        self.nodes
            .get_mut(&child)
            .ok_or(TreeError::UnknownNode { id: child })?
            .set_parent(None);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum TreeError {
    #[snafu(display("Node {} does not exist", id))]
    UnknownNode { id: NodeId },
    #[snafu(display("Node {} is not a folder", id))]
    NotAFolder { id: NodeId },
    #[snafu(display("Node {} is already attached under {}", id, parent))]
    AlreadyAttached { id: NodeId, parent: FolderId },
    #[snafu(display("Node {} is not attached to any folder", id))]
    NotAttached { id: NodeId },
    #[snafu(display("Node {} is still attached under {}", id, parent))]
    StillAttached { id: NodeId, parent: FolderId },
    #[snafu(display("The root folder cannot be deleted, moved or attached"))]
    RootIsFixed,
    #[snafu(display("Folder {} already has a child named '{}'", parent, name))]
    NameTaken { parent: FolderId, name: String },
    #[snafu(display("Placing {} under {} would create a cycle", id, target))]
    WouldCycle { id: NodeId, target: NodeId },
}

impl TreeError {
    /// True for errors caused by the shape of the tree rather than a bad id.
    pub fn is_structural_conflict(&self) -> bool {
        !matches!(
            self,
            TreeError::UnknownNode { .. } | TreeError::NotAFolder { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::{MediaFile, TextFile};
    use rstest::{fixture, rstest};

    fn text(tree: &mut FileTree, name: &str) -> NodeId {
        tree.create_file(name, FileData::Text(TextFile::new(1, "utf-8", 1)))
    }

    #[fixture]
    fn tree() -> FileTree {
        FileTree::new()
    }

    #[rstest]
    fn new_tree_only_holds_root(tree: FileTree) {
        assert_eq!(tree.node_count(), 1);
        let root = tree.get(tree.root().id()).unwrap();
        assert_eq!(root.name(), "/");
        assert!(root.parent().is_none());
        assert_eq!(tree.path(tree.root().id()).unwrap(), "/");
    }

    #[rstest]
    fn attach_sets_parent_and_lists_child(mut tree: FileTree) {
        let docs = tree.create_folder("docs");
        let file = text(&mut tree, "a.txt");

        tree.attach(tree.root(), docs.id()).unwrap();
        tree.attach(docs, file).unwrap();

        assert_eq!(tree.parent(file).unwrap(), Some(docs));
        assert_eq!(tree.children(docs.id()).unwrap(), &[file]);
        assert_eq!(tree.path(file).unwrap(), "/docs/a.txt");
    }

    #[rstest]
    fn attach_rejects_node_with_a_parent(mut tree: FileTree) {
        let first = tree.create_folder("first");
        let second = tree.create_folder("second");
        let file = text(&mut tree, "a.txt");
        tree.attach(first, file).unwrap();

        let err = tree.attach(second, file).unwrap_err();

        assert_eq!(err, TreeError::AlreadyAttached { id: file, parent: first });
        assert!(err.is_structural_conflict());
        assert!(tree.children(second.id()).unwrap().is_empty());
        assert_eq!(tree.parent(file).unwrap(), Some(first));
    }

    #[rstest]
    fn attach_rejects_duplicate_sibling_names(mut tree: FileTree) {
        let a = text(&mut tree, "same.txt");
        let b = tree.create_file("same.txt", FileData::Image(MediaFile::new(1, 1, 1)));
        tree.attach(tree.root(), a).unwrap();

        let err = tree.attach(tree.root(), b).unwrap_err();

        assert!(matches!(err, TreeError::NameTaken { .. }));
        assert_eq!(tree.parent(b).unwrap(), None);
    }

    #[rstest]
    fn attach_rejects_cycles_in_detached_subtrees(mut tree: FileTree) {
        let outer = tree.create_folder("outer");
        let inner = tree.create_folder("inner");
        tree.attach(outer, inner.id()).unwrap();

        let err = tree.attach(inner, outer.id()).unwrap_err();

        assert!(matches!(err, TreeError::WouldCycle { .. }));
        let self_err = tree.attach(outer, outer.id()).unwrap_err();
        assert!(matches!(self_err, TreeError::WouldCycle { .. }));
    }

    #[rstest]
    fn root_cannot_be_detached_or_attached(mut tree: FileTree) {
        let folder = tree.create_folder("folder");
        let root = tree.root();

        assert_eq!(tree.detach(root.id()), Err(TreeError::RootIsFixed));
        assert_eq!(tree.attach(folder, root.id()), Err(TreeError::RootIsFixed));
        assert_eq!(tree.node_count(), 2);
    }

    #[rstest]
    fn detach_clears_both_links(mut tree: FileTree) {
        let file = text(&mut tree, "a.txt");
        tree.attach(tree.root(), file).unwrap();

        let former = tree.detach(file).unwrap();

        assert_eq!(former, tree.root());
        assert_eq!(tree.parent(file).unwrap(), None);
        assert!(tree.children(tree.root().id()).unwrap().is_empty());
        assert_eq!(tree.detach(file), Err(TreeError::NotAttached { id: file }));
    }

    #[rstest]
    fn relocate_moves_between_folders(mut tree: FileTree) {
        let from = tree.create_folder("from");
        let to = tree.create_folder("to");
        tree.attach(tree.root(), from.id()).unwrap();
        tree.attach(tree.root(), to.id()).unwrap();
        let file = text(&mut tree, "a.txt");
        tree.attach(from, file).unwrap();

        let old = tree.relocate(file, to).unwrap();

        assert_eq!(old, from);
        assert!(tree.children(from.id()).unwrap().is_empty());
        assert_eq!(tree.children(to.id()).unwrap(), &[file]);
        assert_eq!(tree.path(file).unwrap(), "/to/a.txt");
    }

    #[rstest]
    fn relocate_into_own_subtree_leaves_tree_unchanged(mut tree: FileTree) {
        let outer = tree.create_folder("outer");
        let inner = tree.create_folder("inner");
        tree.attach(tree.root(), outer.id()).unwrap();
        tree.attach(outer, inner.id()).unwrap();

        let err = tree.relocate(outer.id(), inner).unwrap_err();

        assert!(matches!(err, TreeError::WouldCycle { .. }));
        assert_eq!(tree.parent(outer.id()).unwrap(), Some(tree.root()));
        assert_eq!(tree.children(outer.id()).unwrap(), &[inner.id()]);
    }

    #[rstest]
    fn relocate_into_current_parent_is_noop(mut tree: FileTree) {
        let file = text(&mut tree, "a.txt");
        tree.attach(tree.root(), file).unwrap();

        assert_eq!(tree.relocate(file, tree.root()).unwrap(), tree.root());
        assert_eq!(tree.children(tree.root().id()).unwrap(), &[file]);
    }

    #[rstest]
    fn resolve_follows_names(mut tree: FileTree) {
        let docs = tree.create_folder("docs");
        let file = text(&mut tree, "a.txt");
        tree.attach(tree.root(), docs.id()).unwrap();
        tree.attach(docs, file).unwrap();

        assert_eq!(tree.resolve("/"), Some(tree.root().id()));
        assert_eq!(tree.resolve("/docs"), Some(docs.id()));
        assert_eq!(tree.resolve("/docs/a.txt"), Some(file));
        assert_eq!(tree.resolve("/docs/missing"), None);
        assert_eq!(tree.resolve("docs"), None);
    }

    #[rstest]
    fn detached_paths_are_relative(mut tree: FileTree) {
        let drafts = tree.create_folder("drafts");
        let file = text(&mut tree, "a.txt");
        tree.attach(drafts, file).unwrap();

        assert_eq!(tree.path(file).unwrap(), "drafts/a.txt");
    }

    #[rstest]
    fn purge_removes_detached_subtree(mut tree: FileTree) {
        let drafts = tree.create_folder("drafts");
        let file = text(&mut tree, "a.txt");
        tree.attach(drafts, file).unwrap();

        let removed = tree.purge(drafts.id()).unwrap();

        assert_eq!(removed, vec![drafts.id(), file]);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.get(file), Err(TreeError::UnknownNode { id: file }));
    }

    #[rstest]
    fn purge_refuses_attached_nodes(mut tree: FileTree) {
        let file = text(&mut tree, "a.txt");
        tree.attach(tree.root(), file).unwrap();

        assert!(matches!(
            tree.purge(file),
            Err(TreeError::StillAttached { .. })
        ));
        assert_eq!(tree.purge(tree.root().id()), Err(TreeError::RootIsFixed));
    }

    #[rstest]
    fn folder_conversion_checks_kind(mut tree: FileTree) {
        let file = text(&mut tree, "a.txt");
        assert_eq!(tree.folder(file), Err(TreeError::NotAFolder { id: file }));
        assert_eq!(tree.folder(tree.root().id()), Ok(tree.root()));
    }
}
