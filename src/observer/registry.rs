use std::collections::HashMap;
use std::sync::Arc;

use derive_more::Display;
use snafu::Whatever;
use tracing::{debug, warn};

use crate::filesystem::{FolderId, NodeId};

/// Structural change reported to the observers of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ChangeEvent {
    #[display("{child} added to {parent}")]
    ChildAdded { parent: FolderId, child: NodeId },
    #[display("{child} removed from {parent}")]
    ChildRemoved { parent: FolderId, child: NodeId },
}

impl ChangeEvent {
    pub fn parent(&self) -> FolderId {
        match self {
            ChangeEvent::ChildAdded { parent, .. } | ChangeEvent::ChildRemoved { parent, .. } => {
                *parent
            }
        }
    }

    pub fn child(&self) -> NodeId {
        match self {
            ChangeEvent::ChildAdded { child, .. } | ChangeEvent::ChildRemoved { child, .. } => {
                *child
            }
        }
    }
}

/// Listener for changes to the children of one node.
pub trait NodeObserver: Send + Sync {
    fn notify(&self, event: &ChangeEvent) -> Result<(), Whatever>;
}

impl<F> NodeObserver for F
where
    F: Fn(&ChangeEvent) -> Result<(), Whatever> + Send + Sync,
{
    fn notify(&self, event: &ChangeEvent) -> Result<(), Whatever> {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub delivered: usize,
    pub failed: usize,
}

/// Maps node ids to the observers interested in them, in registration order.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: HashMap<NodeId, Vec<Arc<dyn NodeObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `observer` for `node`. Registering the same observer twice makes
    /// it fire twice.
    pub fn register(&mut self, observer: Arc<dyn NodeObserver>, node: NodeId) {
        let listeners = self.observers.entry(node).or_default();
        listeners.push(observer);
        debug!("Registered observer on {} ({} total)", node, listeners.len());
    }

    /// Removes one registration of `observer` from `node`, if there is one.
    pub fn unregister(&mut self, observer: &Arc<dyn NodeObserver>, node: NodeId) {
        let Some(listeners) = self.observers.get_mut(&node) else {
            return;
        };
        if let Some(position) = listeners.iter().position(|o| same_observer(o, observer)) {
            listeners.remove(position);
            debug!("Unregistered observer from {}", node);
        }
        if listeners.is_empty() {
            self.observers.remove(&node);
        }
    }

    /// Drops every registration on `node`.
    pub fn forget(&mut self, node: NodeId) -> usize {
        self.observers
            .remove(&node)
            .map(|listeners| listeners.len())
            .unwrap_or_default()
    }

    pub fn count(&self, node: NodeId) -> usize {
        self.observers.get(&node).map_or(0, Vec::len)
    }

    /// Number of nodes with at least one observer.
    pub fn watched_nodes(&self) -> usize {
        self.observers.len()
    }

    /// Fires every observer registered on the event's parent folder.
    ///
    /// A failing observer is logged and skipped; the rest still run.
    pub fn notify(&self, event: &ChangeEvent) -> NotifyOutcome {
        let node = event.parent().id();
        let mut outcome = NotifyOutcome::default();
        let Some(listeners) = self.observers.get(&node) else {
            return outcome;
        };

        for listener in listeners {
            match listener.notify(event) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    warn!("Observer on {} failed while handling '{}': {}", node, event, e);
                    outcome.failed += 1;
                }
            }
        }
        debug!(
            "Notified {} observers of {} ({} failed)",
            outcome.delivered + outcome.failed,
            node,
            outcome.failed
        );
        outcome
    }
}

fn same_observer(a: &Arc<dyn NodeObserver>, b: &Arc<dyn NodeObserver>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
