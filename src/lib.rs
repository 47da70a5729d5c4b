//! Implicitly constructed computation graphs.
//!
//! Declaring a [`Placeholder`], [`Variable`] or operation registers it into a
//! [`Graph`] and wires it to its operands; a [`Session`] then evaluates any
//! node by resolving its dependencies.
//!
//! ```
//! use std::collections::HashMap;
//! use opgraph::{Add, Graph, MatMul, NumericTensor, Placeholder, Session, Variable};
//!
//! let graph = Graph::new();
//! graph.set_as_default();
//!
//! let a = Variable::new(Some(NumericTensor::from_rows(vec![vec![10.0f64, 20.0]])?))?;
//! let b = Variable::new(Some(NumericTensor::from(1.0f64)))?;
//! let x = Placeholder::new()?;
//! let z = Add::new(MatMul::new(a, x)?, b)?;
//!
//! let feed = HashMap::from([(x, NumericTensor::from_vec(vec![10.0f64, 20.0]))]);
//! let result = Session::new(&graph).run(z, &feed)?;
//! assert_eq!(result.to_flat_vec::<f64>()?, vec![501.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod dtype;
pub mod graph;
pub mod ndarray_backend;
pub mod numeric_tensor;
pub mod session;

pub use graph::nodes::{NodeKind, Placeholder, Variable};
pub use graph::ops::{Add, AnyOperation, MatMul, Multiply, Operation};
pub use graph::{Graph, GraphError, GraphNodeId, clear_default_graph, default_graph};
pub use numeric_tensor::{NumericTensor, NumericTensorError};
pub use session::{Session, SessionError, SessionObserver};
