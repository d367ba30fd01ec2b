//! YAML layout files describing a tree to build.

mod layout;

pub use layout::{LAYOUT_FILE_NAME, Layout, LayoutEntry, LayoutError};
