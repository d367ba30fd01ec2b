//! Per-node change observation.

mod registry;

pub use registry::{ChangeEvent, NodeObserver, NotifyOutcome, ObserverRegistry};
