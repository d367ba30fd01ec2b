use std::collections::HashSet;

use snafu::Snafu;
use tracing::debug;

use crate::filesystem::{FileTree, Node, NodeId, TreeError};

use super::Filter;

/// Deepest nesting a walk accepts before giving up.
pub const MAX_DEPTH: usize = 1024;

/// One node as seen by a [`Visitor`] during a walk.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub id: NodeId,
    pub node: &'a Node,
    pub depth: usize,
    tree: &'a FileTree,
}

impl Visit<'_> {
    pub fn path(&self) -> Result<String, TreeError> {
        self.tree.path(self.id)
    }
}

pub trait Visitor {
    fn visit(&mut self, visit: &Visit<'_>);
}

/// Pre-order depth-first walk starting at `start`, children in insertion order.
///
/// Every reachable node is handed to `visitor` exactly once. A node seen twice
/// or nesting deeper than [`MAX_DEPTH`] aborts the walk.
pub fn walk<V: Visitor + ?Sized>(
    tree: &FileTree,
    start: NodeId,
    visitor: &mut V,
) -> Result<usize, TraversalError> {
    if !tree.contains(start) {
        return Err(TraversalError::UnknownStart { id: start });
    }

    let mut seen = HashSet::new();
    let mut stack = vec![(start, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        if depth > MAX_DEPTH {
            return Err(TraversalError::DepthExceeded { id, limit: MAX_DEPTH });
        }
        if !seen.insert(id) {
            return Err(TraversalError::CycleDetected { id });
        }
        let Ok(node) = tree.get(id) else {
            debug!("Skipping dangling child {} during walk", id);
            continue;
        };

        visitor.visit(&Visit {
            id,
            node,
            depth,
            tree,
        });
        stack.extend(node.children().iter().rev().map(|child| (*child, depth + 1)));
    }

    debug!("Walk from {} visited {} nodes", start, seen.len());
    Ok(seen.len())
}

/// Visitor that feeds matching nodes into an accumulator.
pub struct Fold<F, A, C> {
    filter: F,
    acc: A,
    combine: C,
}

impl<F, A, C> Visitor for Fold<F, A, C>
where
    F: Filter,
    C: FnMut(&mut A, &Visit<'_>),
{
    fn visit(&mut self, visit: &Visit<'_>) {
        if self.filter.matches(visit.node) {
            (self.combine)(&mut self.acc, visit);
        }
    }
}

/// Folds every node under `start` accepted by `filter` into a single value.
pub fn fold<F, A, C>(
    tree: &FileTree,
    start: NodeId,
    init: A,
    filter: F,
    combine: C,
) -> Result<A, TraversalError>
where
    F: Filter,
    C: FnMut(&mut A, &Visit<'_>),
{
    let mut folder = Fold {
        filter,
        acc: init,
        combine,
    };
    walk(tree, start, &mut folder)?;
    Ok(folder.acc)
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum TraversalError {
    #[snafu(display("Cannot start a walk at unknown node {}", id))]
    UnknownStart { id: NodeId },
    #[snafu(display("Node {} was reached twice, the tree contains a cycle", id))]
    CycleDetected { id: NodeId },
    #[snafu(display("Node {} is nested deeper than {} levels", id, limit))]
    DepthExceeded { id: NodeId, limit: usize },
}
