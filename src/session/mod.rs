//! Evaluation of a target node.
//!
//! A [`Session`] walks the operands of the target in post-order and resolves
//! every node to a value: placeholders from the caller's feed, variables
//! from their stored value, operations through `compute`.
use crate::graph::nodes::NodeKind;
use crate::graph::{Graph, GraphError, GraphNodeId};
use crate::numeric_tensor::NumericTensor;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

pub mod observer;

pub use observer::SessionObserver;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    GraphError(#[from] GraphError),
    #[error("No value fed for placeholder {0:?}")]
    MissingPlaceholderValue(GraphNodeId),
    #[error("Variable {0:?} has no value")]
    UninitializedVariable(GraphNodeId),
    #[error("Fed node {0:?} is not a placeholder")]
    NotAPlaceholder(GraphNodeId),
    #[error("Operand {0:?} has no value when its consumer runs")]
    UnresolvedOperand(GraphNodeId),
    #[error("Cycle detected at node {0:?}")]
    CycleDetected(GraphNodeId),
    #[error("Error evaluating {0} node {1:?}: {2}")]
    EvalError(String, GraphNodeId, GraphError),
}

/// Nodes that `target` depends on, operands before consumers, ending with
/// `target` itself. Each node appears once even when shared.
pub fn traverse_postorder(
    graph: &Graph,
    target: GraphNodeId,
) -> Result<Vec<GraphNodeId>, SessionError> {
    enum Visit {
        Enter(GraphNodeId),
        Exit(GraphNodeId),
    }

    let mut order = Vec::new();
    let mut done = HashSet::new();
    let mut on_path = HashSet::new();
    let mut stack = vec![Visit::Enter(target)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id) => {
                if done.contains(&id) {
                    continue;
                }
                if !on_path.insert(id) {
                    return Err(SessionError::CycleDetected(id));
                }
                stack.push(Visit::Exit(id));
                // Reversed so operands are visited left to right
                for input in graph.input_nodes(id)?.into_iter().rev() {
                    stack.push(Visit::Enter(input));
                }
            }
            Visit::Exit(id) => {
                on_path.remove(&id);
                if done.insert(id) {
                    order.push(id);
                }
            }
        }
    }

    Ok(order)
}

/// Values of `inputs`, in order, from the nodes already evaluated this run.
fn gather_operands(
    values: &HashMap<GraphNodeId, NumericTensor>,
    inputs: &[GraphNodeId],
) -> Result<Vec<NumericTensor>, SessionError> {
    inputs
        .iter()
        .map(|x| values.get(x).cloned().ok_or(SessionError::UnresolvedOperand(*x)))
        .collect()
}

pub struct Session {
    graph: Graph,
}

impl Session {
    pub fn new(graph: &Graph) -> Self {
        Self {
            graph: graph.clone(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn run(
        &self,
        target: GraphNodeId,
        feed: &HashMap<GraphNodeId, NumericTensor>,
    ) -> Result<NumericTensor, SessionError> {
        self.run_with_observer(target, feed, &mut ())
    }

    pub fn run_with_observer<T: SessionObserver>(
        &self,
        target: GraphNodeId,
        feed: &HashMap<GraphNodeId, NumericTensor>,
        observer: &mut T,
    ) -> Result<NumericTensor, SessionError> {
        for id in feed.keys() {
            if self.graph.node_kind(*id)? != NodeKind::Placeholder {
                return Err(SessionError::NotAPlaceholder(*id));
            }
        }

        let order = traverse_postorder(&self.graph, target)?;
        log::debug!("Evaluating {} nodes for target {:?}", order.len(), target);

        let mut values: HashMap<GraphNodeId, NumericTensor> = HashMap::new();
        for node_id in order {
            let start_instant = Instant::now();
            let kind = self.graph.node_kind(node_id)?;
            let value = match kind {
                NodeKind::Placeholder => feed
                    .get(&node_id)
                    .cloned()
                    .ok_or(SessionError::MissingPlaceholderValue(node_id))?,
                NodeKind::Variable => self
                    .graph
                    .variable_value(node_id)?
                    .ok_or(SessionError::UninitializedVariable(node_id))?,
                NodeKind::Operation => {
                    let inputs = gather_operands(&values, &self.graph.input_nodes(node_id)?)?;
                    self.graph.compute(node_id, &inputs).map_err(|e| {
                        let name = self.graph.node_name(node_id).unwrap_or_default();
                        SessionError::EvalError(name, node_id, e)
                    })?
                }
            };
            let end_instant = Instant::now();
            log::trace!("{kind} {:?} -> shape {:?}", node_id, value.shape());
            observer.on_node_executed(node_id, start_instant, end_instant);
            observer.on_value_assigned(node_id, &value);
            values.insert(node_id, value);
        }

        values
            .remove(&target)
            .ok_or(SessionError::UnresolvedOperand(target))
    }
}
