use std::sync::Arc;

use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::filesystem::{
    FileData, FileTree, FileType, FolderId, MediaFile, Node, NodeId, TextFile, TreeError,
};
use crate::observer::{ChangeEvent, NodeObserver, ObserverRegistry};
use crate::traversal::{
    AllFiles, CountVisitor, FileName, Filter, ImagesOnly, PrintVisitor, SearchResult,
    TraversalError, Visit, fold, walk,
};

/// Single owner of a file tree and of the observers watching it.
///
/// Every structural mutation goes through here so that the observers of the
/// affected folder are told about it once the change has been committed.
#[derive(Default)]
pub struct FileManager {
    tree: FileTree,
    observers: ObserverRegistry,
}

impl FileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> FolderId {
        self.tree.root()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn node(&self, id: impl Into<NodeId>) -> Result<&Node, ManagerError> {
        self.tree.get(id.into()).context(StructureSnafu)
    }

    pub fn folder(&self, id: impl Into<NodeId>) -> Result<FolderId, ManagerError> {
        self.tree.folder(id.into()).context(StructureSnafu)
    }

    pub fn parent_of(&self, id: impl Into<NodeId>) -> Result<Option<FolderId>, ManagerError> {
        self.tree.parent(id.into()).context(StructureSnafu)
    }

    pub fn path_of(&self, id: impl Into<NodeId>) -> Result<String, ManagerError> {
        self.tree.path(id.into()).context(StructureSnafu)
    }

    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        self.tree.resolve(path)
    }

    /// Creates a detached text file.
    pub fn new_text_file_node(
        &mut self,
        file_type: FileType,
        name: impl Into<String>,
        size: u64,
        text_encoding: impl Into<String>,
        page_count: u64,
    ) -> Result<NodeId, ManagerError> {
        let data = match file_type {
            FileType::Text => FileData::Text(TextFile::new(size, text_encoding, page_count)),
            _ => {
                return Err(ManagerError::UnsupportedType {
                    requested: file_type,
                    family: "text",
                });
            }
        };
        Ok(self.create_file(checked_name(name.into())?, data))
    }

    /// Creates a detached image or video file.
    pub fn new_media_file_node(
        &mut self,
        file_type: FileType,
        name: impl Into<String>,
        size: u64,
        height: u64,
        width: u64,
    ) -> Result<NodeId, ManagerError> {
        let media = MediaFile::new(size, height, width);
        let data = match file_type {
            FileType::Image => FileData::Image(media),
            FileType::Video => FileData::Video(media),
            _ => {
                return Err(ManagerError::UnsupportedType {
                    requested: file_type,
                    family: "media",
                });
            }
        };
        Ok(self.create_file(checked_name(name.into())?, data))
    }

    pub fn new_folder_node(
        &mut self,
        file_type: FileType,
        name: impl Into<String>,
    ) -> Result<FolderId, ManagerError> {
        if file_type != FileType::Folder {
            return Err(ManagerError::UnsupportedType {
                requested: file_type,
                family: "folder",
            });
        }
        let name = checked_name(name.into())?;
        let id = self.tree.create_folder(name.as_str());
        debug!("Created folder {} '{}'", id, name);
        Ok(id)
    }

    /// Attaches a detached `node` under `parent` and notifies `parent`'s observers.
    pub fn add(
        &mut self,
        parent: FolderId,
        node: impl Into<NodeId>,
    ) -> Result<NodeId, ManagerError> {
        let node = node.into();
        self.tree.attach(parent, node).context(StructureSnafu)?;
        self.observers.notify(&ChangeEvent::ChildAdded {
            parent,
            child: node,
        });
        Ok(node)
    }

    /// Detaches `node` from its parent and notifies that former parent.
    pub fn delete(&mut self, node: impl Into<NodeId>) -> Result<NodeId, ManagerError> {
        let node = node.into();
        let parent = self.tree.detach(node).context(StructureSnafu)?;
        self.observers.notify(&ChangeEvent::ChildRemoved {
            parent,
            child: node,
        });
        Ok(node)
    }

    /// Moves `node` under `new_parent`.
    ///
    /// The old parent sees `ChildRemoved`, the new one `ChildAdded`. Moving a
    /// node into the folder already holding it only reports `ChildAdded`.
    pub fn move_to(
        &mut self,
        node: impl Into<NodeId>,
        new_parent: FolderId,
    ) -> Result<NodeId, ManagerError> {
        let node = node.into();
        let old_parent = self.tree.relocate(node, new_parent).context(StructureSnafu)?;
        if old_parent != new_parent {
            self.observers.notify(&ChangeEvent::ChildRemoved {
                parent: old_parent,
                child: node,
            });
        }
        self.observers.notify(&ChangeEvent::ChildAdded {
            parent: new_parent,
            child: node,
        });
        Ok(node)
    }

    /// Direct children of `node`; empty for files.
    pub fn list(&self, node: impl Into<NodeId>) -> Result<Vec<NodeId>, ManagerError> {
        Ok(self
            .tree
            .children(node.into())
            .context(StructureSnafu)?
            .to_vec())
    }

    /// Permanently drops a deleted node, its subtree and their observers.
    pub fn purge(&mut self, node: impl Into<NodeId>) -> Result<usize, ManagerError> {
        let removed = self.tree.purge(node.into()).context(StructureSnafu)?;
        let observers: usize = removed.iter().map(|id| self.observers.forget(*id)).sum();
        debug!(
            "Purged {} nodes and {} observer registrations",
            removed.len(),
            observers
        );
        Ok(removed.len())
    }

    pub fn register(
        &mut self,
        observer: Arc<dyn NodeObserver>,
        node: impl Into<NodeId>,
    ) -> Result<(), ManagerError> {
        let node = node.into();
        self.tree.get(node).context(StructureSnafu)?;
        self.observers.register(observer, node);
        Ok(())
    }

    pub fn unregister(&mut self, observer: &Arc<dyn NodeObserver>, node: impl Into<NodeId>) {
        self.observers.unregister(observer, node.into());
    }

    pub fn observer_count(&self, node: impl Into<NodeId>) -> usize {
        self.observers.count(node.into())
    }

    /// Number of nodes that currently have observers.
    pub fn watched_nodes(&self) -> usize {
        self.observers.watched_nodes()
    }

    /// Counts every file at or below `node`.
    pub fn file_amount(&self, node: impl Into<NodeId>) -> Result<usize, ManagerError> {
        self.count_with(node.into(), AllFiles)
    }

    pub fn image_file_amount(&self, node: impl Into<NodeId>) -> Result<usize, ManagerError> {
        self.count_with(node.into(), ImagesOnly)
    }

    /// Path of the first file named `name` at or below `node`, in pre-order.
    pub fn find_by_file_name(
        &self,
        node: impl Into<NodeId>,
        name: &str,
    ) -> Result<SearchResult, ManagerError> {
        let start = node.into();
        let mut visitor = PrintVisitor::new(FileName::new(name));
        walk(&self.tree, start, &mut visitor).context(TraversalSnafu)?;
        debug!("Search for '{}' from {}: {}", name, start, visitor.result());
        Ok(visitor.into_result())
    }

    /// Runs an arbitrary fold over the subtree at `node`.
    pub fn fold<F, A, C>(
        &self,
        node: impl Into<NodeId>,
        init: A,
        filter: F,
        combine: C,
    ) -> Result<A, ManagerError>
    where
        F: Filter,
        C: FnMut(&mut A, &Visit<'_>),
    {
        fold(&self.tree, node.into(), init, filter, combine).context(TraversalSnafu)
    }

    fn count_with(&self, start: NodeId, filter: impl Filter) -> Result<usize, ManagerError> {
        let mut visitor = CountVisitor::new(filter);
        walk(&self.tree, start, &mut visitor).context(TraversalSnafu)?;
        debug!("Counted {} matching nodes from {}", visitor.count(), start);
        Ok(visitor.count())
    }

    fn create_file(&mut self, name: String, data: FileData) -> NodeId {
        let file_type = data.file_type();
        let id = self.tree.create_file(name.as_str(), data);
        debug!("Created {} file {} '{}'", file_type, id, name);
        id
    }
}

/// Node names are single path segments: non-empty and free of `/`.
fn checked_name(name: String) -> Result<String, ManagerError> {
    if name.is_empty() || name.contains('/') {
        return InvalidNameSnafu { name }.fail();
    }
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ManagerError {
    #[snafu(display("Cannot create a {} node through the {} factory", requested, family))]
    UnsupportedType {
        requested: FileType,
        family: &'static str,
    },
    #[snafu(display("'{}' is not a valid node name", name))]
    InvalidName { name: String },
    #[snafu(display("Invalid tree operation"))]
    Structure { source: TreeError },
    #[snafu(display("Traversal failed"))]
    Traversal { source: TraversalError },
}

impl ManagerError {
    pub fn is_structural_conflict(&self) -> bool {
        matches!(self, ManagerError::Structure { source } if source.is_structural_conflict())
    }
}
