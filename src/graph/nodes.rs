use crate::graph::ops::{AnyOperation, Operation};
use crate::graph::{GraphError, GraphNodeId, default_graph};
use crate::numeric_tensor::NumericTensor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum NodeKind {
    Placeholder,
    Variable,
    Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnyNode {
    Placeholder(Placeholder),
    Variable(Variable),
    Operation(AnyOperation),
}

impl AnyNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AnyNode::Placeholder(_) => NodeKind::Placeholder,
            AnyNode::Variable(_) => NodeKind::Variable,
            AnyNode::Operation(_) => NodeKind::Operation,
        }
    }

    pub fn input_nodes(&self) -> &[GraphNodeId] {
        match self {
            AnyNode::Placeholder(_) | AnyNode::Variable(_) => &[],
            AnyNode::Operation(op) => op.input_nodes(),
        }
    }
}

/// A value supplied by the caller at evaluation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Placeholder {}

impl Placeholder {
    /// Registers a new placeholder in the default graph.
    pub fn new() -> Result<GraphNodeId, GraphError> {
        Ok(default_graph()?.placeholder())
    }
}

/// A value held by the graph and reassigned only by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variable {
    value: Option<NumericTensor>,
}

impl Variable {
    /// Registers a new variable in the default graph.
    pub fn new(initial_value: Option<NumericTensor>) -> Result<GraphNodeId, GraphError> {
        Ok(default_graph()?.variable(initial_value))
    }

    pub(crate) fn with_value(value: Option<NumericTensor>) -> Self {
        Self { value }
    }

    pub fn value(&self) -> Option<&NumericTensor> {
        self.value.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: Option<NumericTensor>) {
        self.value = value;
    }
}
