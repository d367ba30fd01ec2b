//! Depth-first traversal with pluggable filters and accumulators.

mod filter;
mod visitor;
mod walk;

pub use filter::{AllFiles, FileName, Filter, ImagesOnly};
pub use visitor::{CountVisitor, PrintVisitor, SearchResult};
pub use walk::{Fold, MAX_DEPTH, TraversalError, Visit, Visitor, fold, walk};
