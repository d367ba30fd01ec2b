//! The file manager façade and its thread-safe handle.

mod file_manager;
mod shared;

pub use file_manager::{FileManager, ManagerError};
pub use shared::SharedFileManager;
