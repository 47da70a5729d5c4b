use crate::graph::{Graph, GraphError};
use std::cell::RefCell;

thread_local! {
    static DEFAULT_GRAPH: RefCell<Option<Graph>> = const { RefCell::new(None) };
}

/// Handle to the graph implicit constructors register into.
pub fn default_graph() -> Result<Graph, GraphError> {
    DEFAULT_GRAPH
        .with(|slot| slot.borrow().clone())
        .ok_or(GraphError::NoDefaultGraph)
}

pub fn clear_default_graph() {
    if let Some(previous) = replace_default_graph(None) {
        log::debug!("Default graph {:?} cleared", previous.uid());
    }
}

pub(crate) fn replace_default_graph(graph: Option<Graph>) -> Option<Graph> {
    DEFAULT_GRAPH.with(|slot| slot.replace(graph))
}

/// Restores the previously active default graph on drop.
#[must_use = "the scoped default graph is released as soon as the guard is dropped"]
pub struct DefaultGraphGuard {
    previous: Option<Graph>,
}

impl DefaultGraphGuard {
    pub(crate) fn new(previous: Option<Graph>) -> Self {
        Self { previous }
    }
}

impl Drop for DefaultGraphGuard {
    fn drop(&mut self) {
        replace_default_graph(self.previous.take());
    }
}
