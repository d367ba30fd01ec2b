use derive_more::{Display, From, Into};

/// Handle to a node stored in a [`FileTree`](super::FileTree).
///
/// Ids are handed out in increasing order and never reused, so a stale id
/// simply stops resolving once its node is purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("#{_0}")]
pub struct NodeId(u64);

/// A [`NodeId`] known to refer to a folder.
///
/// Only the tree can mint one, which keeps leaves out of every operation
/// that needs a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("{_0}")]
pub struct FolderId(NodeId);

impl FolderId {
    pub(crate) fn new(id: NodeId) -> Self {
        Self(id)
    }

    pub fn id(self) -> NodeId {
        self.0
    }
}

/// Type tag accepted by the factory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FileType {
    #[display("folder")]
    Folder,
    #[display("text")]
    Text,
    #[display("image")]
    Image,
    #[display("video")]
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub size: u64,
    pub encoding: String,
    pub page_count: u64,
}

impl TextFile {
    pub fn new(size: u64, encoding: impl Into<String>, page_count: u64) -> Self {
        Self {
            size,
            encoding: encoding.into(),
            page_count,
        }
    }
}

/// Metadata shared by image and video files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFile {
    pub size: u64,
    pub height: u64,
    pub width: u64,
}

impl MediaFile {
    pub fn new(size: u64, height: u64, width: u64) -> Self {
        Self {
            size,
            height,
            width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    Text(TextFile),
    Image(MediaFile),
    Video(MediaFile),
}

impl FileData {
    pub fn size(&self) -> u64 {
        match self {
            FileData::Text(text) => text.size,
            FileData::Image(media) | FileData::Video(media) => media.size,
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            FileData::Text(_) => FileType::Text,
            FileData::Image(_) => FileType::Image,
            FileData::Video(_) => FileType::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Folder { children: Vec<NodeId> },
    File(FileData),
}

/// A single entry of the tree, either a folder or a leaf file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    parent: Option<FolderId>,
    kind: NodeKind,
}

impl Node {
    pub(crate) fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            kind: NodeKind::Folder {
                children: Vec::new(),
            },
        }
    }

    pub(crate) fn file(name: impl Into<String>, data: FileData) -> Self {
        Self {
            name: name.into(),
            parent: None,
            kind: NodeKind::File(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn file_type(&self) -> FileType {
        match &self.kind {
            NodeKind::Folder { .. } => FileType::Folder,
            NodeKind::File(data) => data.file_type(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_folder()
    }

    /// Direct children; always empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Folder { children } => children,
            NodeKind::File(_) => &[],
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<FolderId>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Folder { children } => Some(children),
            NodeKind::File(_) => None,
        }
    }
}
