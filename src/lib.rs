//! Patty: an in-memory virtual filesystem.
//!
//! A [`FileManager`](manager::FileManager) owns a tree of folders and typed
//! files, tells registered observers when a folder's children change, and
//! answers counting and search queries through filtered depth-first walks.

pub mod filesystem;
pub mod layout;
pub mod manager;
pub mod observer;
pub mod traversal;
