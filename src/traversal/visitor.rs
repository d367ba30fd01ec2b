use derive_more::Display;
use tracing::warn;

use crate::filesystem::NodeId;

use super::{Filter, Visit, Visitor};

/// Counts the nodes accepted by its filter.
#[derive(Debug, Clone)]
pub struct CountVisitor<F> {
    filter: F,
    count: usize,
}

impl<F: Filter> CountVisitor<F> {
    pub fn new(filter: F) -> Self {
        Self { filter, count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<F: Filter> Visitor for CountVisitor<F> {
    fn visit(&mut self, visit: &Visit<'_>) {
        if self.filter.matches(visit.node) {
            self.count += 1;
        }
    }
}

/// Outcome of a name search.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SearchResult {
    #[display("{path}")]
    Found { id: NodeId, path: String },
    #[display("not found")]
    NotFound,
}

impl SearchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchResult::Found { .. })
    }

    pub fn id(&self) -> Option<NodeId> {
        match self {
            SearchResult::Found { id, .. } => Some(*id),
            SearchResult::NotFound => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            SearchResult::Found { path, .. } => Some(path),
            SearchResult::NotFound => None,
        }
    }
}

/// Records the path of the first node its filter accepts.
///
/// Later matches are ignored, so the result is the first hit in walk order.
#[derive(Debug, Clone)]
pub struct PrintVisitor<F> {
    filter: F,
    result: SearchResult,
}

impl<F: Filter> PrintVisitor<F> {
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            result: SearchResult::NotFound,
        }
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn into_result(self) -> SearchResult {
        self.result
    }
}

impl<F: Filter> Visitor for PrintVisitor<F> {
    fn visit(&mut self, visit: &Visit<'_>) {
        if self.result.is_found() || !self.filter.matches(visit.node) {
            return;
        }
        match visit.path() {
            Ok(path) => {
                self.result = SearchResult::Found { id: visit.id, path };
            }
            Err(e) => warn!("Could not build path for {}: {}", visit.id, e),
        }
    }
}
