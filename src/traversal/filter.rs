use crate::filesystem::{FileType, Node};

/// Predicate deciding which nodes contribute to a visitor's result.
pub trait Filter {
    fn matches(&self, node: &Node) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Node) -> bool,
{
    fn matches(&self, node: &Node) -> bool {
        self(node)
    }
}

/// Every leaf, whatever its type.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFiles;

impl Filter for AllFiles {
    fn matches(&self, node: &Node) -> bool {
        node.is_leaf()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImagesOnly;

impl Filter for ImagesOnly {
    fn matches(&self, node: &Node) -> bool {
        node.file_type() == FileType::Image
    }
}

/// Leaves whose name equals the target exactly.
#[derive(Debug, Clone)]
pub struct FileName(String);

impl FileName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Filter for FileName {
    fn matches(&self, node: &Node) -> bool {
        node.is_leaf() && node.name() == self.0
    }
}
