//! In-memory filesystem tree.
//!
//! Nodes live in an arena addressed by [`NodeId`]. Folders own the ids of
//! their children while every child keeps a plain back-reference to its parent.

mod node;
mod tree;

pub use node::{FileData, FileType, FolderId, MediaFile, Node, NodeId, NodeKind, TextFile};
pub use tree::{FileTree, TreeError};
