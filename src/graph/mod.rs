//! Graph construction and dependency tracking.
//!
//! A [`Graph`] is an arena of nodes addressed by [`GraphNodeId`]. Nodes are
//! registered as a side effect of construction, either against an explicit
//! graph handle (`graph.add(a, b)`) or against the thread's default graph
//! (`Add::new(a, b)`). Constructing an operation appends it to the consumer
//! list (`output_nodes`) of each of its operands, so the structure can be
//! walked in both directions.
use crate::numeric_tensor::{NumericTensor, NumericTensorError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod default_graph;
pub mod nodes;
pub mod ops;

pub use default_graph::{DefaultGraphGuard, clear_default_graph, default_graph};
use nodes::{AnyNode, NodeKind, Placeholder, Variable};
use ops::{Add, AnyOperation, MatMul, Multiply, Operation};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("No default graph is active")]
    NoDefaultGraph,
    #[error("Unimplemented operation: {0}")]
    UnimplementedOperation(String),
    #[error("Operation {0} expects {1} inputs, got {2}")]
    ArityMismatch(String, usize, usize),
    #[error(transparent)]
    NumericTensorError(#[from] NumericTensorError),
    #[error("Unknown node {0:?}")]
    UnknownNode(GraphNodeId),
    #[error("Node {0:?} belongs to another graph")]
    ForeignNode(GraphNodeId),
    #[error("Node {0:?} is not a variable")]
    NotAVariable(GraphNodeId),
    #[error("Node {0:?} is not an operation")]
    NotAnOperation(GraphNodeId),
}

static NEXT_GRAPH_UID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct GraphUid {
    inner: u64,
}

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct GraphNodeId {
    graph: GraphUid,
    inner: usize,
}

impl GraphNodeId {
    pub fn graph_uid(&self) -> GraphUid {
        self.graph
    }

    /// Position in the graph's declaration order.
    pub fn index(&self) -> usize {
        self.inner
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GraphNode {
    node: AnyNode,
    output_nodes: Vec<GraphNodeId>,
}

#[derive(Debug)]
pub(crate) struct GraphData {
    uid: GraphUid,
    nodes: Vec<GraphNode>,
    operations: Vec<GraphNodeId>,
    placeholders: Vec<GraphNodeId>,
    variables: Vec<GraphNodeId>,
}

impl GraphData {
    fn new() -> Self {
        Self {
            uid: GraphUid {
                inner: NEXT_GRAPH_UID.fetch_add(1, Ordering::Relaxed),
            },
            nodes: Vec::new(),
            operations: Vec::new(),
            placeholders: Vec::new(),
            variables: Vec::new(),
        }
    }

    fn get(&self, id: GraphNodeId) -> Result<&GraphNode, GraphError> {
        if id.graph != self.uid {
            return Err(GraphError::ForeignNode(id));
        }
        self.nodes.get(id.inner).ok_or(GraphError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: GraphNodeId) -> Result<&mut GraphNode, GraphError> {
        if id.graph != self.uid {
            return Err(GraphError::ForeignNode(id));
        }
        self.nodes.get_mut(id.inner).ok_or(GraphError::UnknownNode(id))
    }

    fn push_node(&mut self, node: AnyNode) -> GraphNodeId {
        let id = GraphNodeId {
            graph: self.uid,
            inner: self.nodes.len(),
        };
        self.nodes.push(GraphNode {
            node,
            output_nodes: Vec::new(),
        });
        id
    }

    fn push_op(&mut self, op: AnyOperation) -> Result<GraphNodeId, GraphError> {
        // Validate everything up front so a rejected op leaves no dangling edges
        for input in op.input_nodes() {
            self.get(*input)?;
        }
        let inputs = op.input_nodes().to_vec();
        let name = op.get_name();
        let id = self.push_node(AnyNode::Operation(op));
        for input in inputs {
            self.get_mut(input)?.output_nodes.push(id);
        }
        self.operations.push(id);
        log::debug!("Registered {name} operation {:?}", id);
        Ok(id)
    }
}

/// Shared handle to a computation graph.
///
/// Cloning the handle does not copy the graph. Handles are not `Send`; each
/// thread builds its own graphs.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphData>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Graph {}

impl Graph {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(GraphData::new())),
        }
    }

    pub fn uid(&self) -> GraphUid {
        self.inner.borrow().uid
    }

    /// Installs this graph as the thread's default graph, replacing whatever
    /// was there before.
    pub fn set_as_default(&self) {
        log::debug!("Graph {:?} set as default", self.uid());
        default_graph::replace_default_graph(Some(self.clone()));
    }

    /// Installs this graph as the default until the returned guard is dropped,
    /// at which point the previous default (if any) is restored.
    pub fn as_default(&self) -> DefaultGraphGuard {
        log::debug!("Graph {:?} entered as scoped default", self.uid());
        DefaultGraphGuard::new(default_graph::replace_default_graph(Some(self.clone())))
    }

    pub fn is_default(&self) -> bool {
        default_graph().is_ok_and(|g| g == *self)
    }

    pub fn placeholder(&self) -> GraphNodeId {
        let mut data = self.inner.borrow_mut();
        let id = data.push_node(AnyNode::Placeholder(Placeholder {}));
        data.placeholders.push(id);
        log::debug!("Registered placeholder {:?}", id);
        id
    }

    /// `None` leaves the variable without a value until one is assigned.
    pub fn variable(&self, initial_value: Option<NumericTensor>) -> GraphNodeId {
        let mut data = self.inner.borrow_mut();
        let id = data.push_node(AnyNode::Variable(Variable::with_value(initial_value)));
        data.variables.push(id);
        log::debug!("Registered variable {:?}", id);
        id
    }

    pub fn push_op(&self, op: AnyOperation) -> Result<GraphNodeId, GraphError> {
        self.inner.borrow_mut().push_op(op)
    }

    pub fn add(&self, x: GraphNodeId, y: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        Add::new_in(self, x, y)
    }

    pub fn multiply(&self, a: GraphNodeId, b: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        Multiply::new_in(self, a, b)
    }

    pub fn matmul(&self, a: GraphNodeId, b: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        MatMul::new_in(self, a, b)
    }

    pub fn operations(&self) -> Vec<GraphNodeId> {
        self.inner.borrow().operations.clone()
    }

    pub fn placeholders(&self) -> Vec<GraphNodeId> {
        self.inner.borrow().placeholders.clone()
    }

    pub fn variables(&self) -> Vec<GraphNodeId> {
        self.inner.borrow().variables.clone()
    }

    /// Total number of nodes of every kind.
    pub fn len(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: GraphNodeId) -> bool {
        self.inner.borrow().get(id).is_ok()
    }

    pub fn node_kind(&self, id: GraphNodeId) -> Result<NodeKind, GraphError> {
        Ok(self.inner.borrow().get(id)?.node.kind())
    }

    /// Operation name for operations, the node kind otherwise.
    pub fn node_name(&self, id: GraphNodeId) -> Result<String, GraphError> {
        Ok(match &self.inner.borrow().get(id)?.node {
            AnyNode::Operation(op) => op.get_name(),
            other => other.kind().to_string(),
        })
    }

    pub fn node(&self, id: GraphNodeId) -> Result<AnyNode, GraphError> {
        Ok(self.inner.borrow().get(id)?.node.clone())
    }

    /// Operands of `id`, in declaration order. Empty for leaves.
    pub fn input_nodes(&self, id: GraphNodeId) -> Result<Vec<GraphNodeId>, GraphError> {
        Ok(self.inner.borrow().get(id)?.node.input_nodes().to_vec())
    }

    /// Consumers of `id`, in the order they were declared.
    pub fn output_nodes(&self, id: GraphNodeId) -> Result<Vec<GraphNodeId>, GraphError> {
        Ok(self.inner.borrow().get(id)?.output_nodes.clone())
    }

    pub fn variable_value(&self, id: GraphNodeId) -> Result<Option<NumericTensor>, GraphError> {
        match &self.inner.borrow().get(id)?.node {
            AnyNode::Variable(v) => Ok(v.value().cloned()),
            _ => Err(GraphError::NotAVariable(id)),
        }
    }

    pub fn set_variable_value(
        &self,
        id: GraphNodeId,
        value: Option<NumericTensor>,
    ) -> Result<(), GraphError> {
        match &mut self.inner.borrow_mut().get_mut(id)?.node {
            AnyNode::Variable(v) => {
                v.set_value(value);
                Ok(())
            }
            _ => Err(GraphError::NotAVariable(id)),
        }
    }

    /// Runs the forward rule of operation `id` on already-resolved operand
    /// values. The values are cached on the operation.
    pub fn compute(
        &self,
        id: GraphNodeId,
        inputs: &[NumericTensor],
    ) -> Result<NumericTensor, GraphError> {
        match &mut self.inner.borrow_mut().get_mut(id)?.node {
            AnyNode::Operation(op) => op.compute(inputs),
            _ => Err(GraphError::NotAnOperation(id)),
        }
    }

    /// Operand values last passed to `compute` for operation `id`.
    pub fn cached_inputs(&self, id: GraphNodeId) -> Result<Option<Vec<NumericTensor>>, GraphError> {
        match &self.inner.borrow().get(id)?.node {
            AnyNode::Operation(op) => Ok(op.cached_inputs().map(|x| x.to_vec())),
            _ => Err(GraphError::NotAnOperation(id)),
        }
    }
}
