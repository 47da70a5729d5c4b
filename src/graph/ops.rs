use crate::graph::{Graph, GraphError, GraphNodeId, default_graph};
use crate::numeric_tensor::NumericTensor;
use serde::{Deserialize, Serialize};

pub trait Operation {
    fn input_nodes(&self) -> &[GraphNodeId];

    /// Forward rule over the resolved operand values, in `input_nodes` order.
    fn compute(&mut self, _inputs: &[NumericTensor]) -> Result<NumericTensor, GraphError> {
        Err(GraphError::UnimplementedOperation(self.get_name()))
    }

    /// Operand values from the most recent `compute` call.
    fn cached_inputs(&self) -> Option<&[NumericTensor]> {
        None
    }

    fn get_name(&self) -> String;
}

fn binary_inputs<'a>(
    name: &str,
    inputs: &'a [NumericTensor],
) -> Result<(&'a NumericTensor, &'a NumericTensor), GraphError> {
    match inputs {
        [a, b] => Ok((a, b)),
        _ => Err(GraphError::ArityMismatch(name.to_string(), 2, inputs.len())),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Add {
    input_nodes: [GraphNodeId; 2],
    inputs: Option<[NumericTensor; 2]>,
}

impl Add {
    /// Declares `x + y` in the default graph.
    pub fn new(x: GraphNodeId, y: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        Self::new_in(&default_graph()?, x, y)
    }

    pub fn new_in(graph: &Graph, x: GraphNodeId, y: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        graph.push_op(AnyOperation::Add(Self {
            input_nodes: [x, y],
            inputs: None,
        }))
    }
}

impl Operation for Add {
    fn input_nodes(&self) -> &[GraphNodeId] {
        &self.input_nodes
    }

    fn compute(&mut self, inputs: &[NumericTensor]) -> Result<NumericTensor, GraphError> {
        let (x, y) = binary_inputs("Add", inputs)?;
        self.inputs = Some([x.clone(), y.clone()]);
        Ok(NumericTensor::add(x, y)?)
    }

    fn cached_inputs(&self) -> Option<&[NumericTensor]> {
        self.inputs.as_ref().map(|x| x.as_slice())
    }

    fn get_name(&self) -> String {
        "Add".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Multiply {
    input_nodes: [GraphNodeId; 2],
    inputs: Option<[NumericTensor; 2]>,
}

impl Multiply {
    /// Declares elementwise `a * b` in the default graph.
    pub fn new(a: GraphNodeId, b: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        Self::new_in(&default_graph()?, a, b)
    }

    pub fn new_in(graph: &Graph, a: GraphNodeId, b: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        graph.push_op(AnyOperation::Multiply(Self {
            input_nodes: [a, b],
            inputs: None,
        }))
    }
}

impl Operation for Multiply {
    fn input_nodes(&self) -> &[GraphNodeId] {
        &self.input_nodes
    }

    fn compute(&mut self, inputs: &[NumericTensor]) -> Result<NumericTensor, GraphError> {
        let (a, b) = binary_inputs("Multiply", inputs)?;
        self.inputs = Some([a.clone(), b.clone()]);
        Ok(NumericTensor::mul(a, b)?)
    }

    fn cached_inputs(&self) -> Option<&[NumericTensor]> {
        self.inputs.as_ref().map(|x| x.as_slice())
    }

    fn get_name(&self) -> String {
        "Multiply".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatMul {
    input_nodes: [GraphNodeId; 2],
    inputs: Option<[NumericTensor; 2]>,
}

impl MatMul {
    /// Declares the matrix product `a · b` in the default graph.
    pub fn new(a: GraphNodeId, b: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        Self::new_in(&default_graph()?, a, b)
    }

    pub fn new_in(graph: &Graph, a: GraphNodeId, b: GraphNodeId) -> Result<GraphNodeId, GraphError> {
        graph.push_op(AnyOperation::MatMul(Self {
            input_nodes: [a, b],
            inputs: None,
        }))
    }
}

impl Operation for MatMul {
    fn input_nodes(&self) -> &[GraphNodeId] {
        &self.input_nodes
    }

    fn compute(&mut self, inputs: &[NumericTensor]) -> Result<NumericTensor, GraphError> {
        let (a, b) = binary_inputs("MatMul", inputs)?;
        self.inputs = Some([a.clone(), b.clone()]);
        Ok(NumericTensor::matmul(a, b)?)
    }

    fn cached_inputs(&self) -> Option<&[NumericTensor]> {
        self.inputs.as_ref().map(|x| x.as_slice())
    }

    fn get_name(&self) -> String {
        "MatMul".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnyOperation {
    Add(Add),
    Multiply(Multiply),
    MatMul(MatMul),
}

impl Operation for AnyOperation {
    fn input_nodes(&self) -> &[GraphNodeId] {
        match self {
            AnyOperation::Add(x) => x.input_nodes(),
            AnyOperation::Multiply(x) => x.input_nodes(),
            AnyOperation::MatMul(x) => x.input_nodes(),
        }
    }

    fn compute(&mut self, inputs: &[NumericTensor]) -> Result<NumericTensor, GraphError> {
        match self {
            AnyOperation::Add(x) => x.compute(inputs),
            AnyOperation::Multiply(x) => x.compute(inputs),
            AnyOperation::MatMul(x) => x.compute(inputs),
        }
    }

    fn cached_inputs(&self) -> Option<&[NumericTensor]> {
        match self {
            AnyOperation::Add(x) => x.cached_inputs(),
            AnyOperation::Multiply(x) => x.cached_inputs(),
            AnyOperation::MatMul(x) => x.cached_inputs(),
        }
    }

    fn get_name(&self) -> String {
        match self {
            AnyOperation::Add(x) => x.get_name(),
            AnyOperation::Multiply(x) => x.get_name(),
            AnyOperation::MatMul(x) => x.get_name(),
        }
    }
}
