use crate::graph::GraphNodeId;
use crate::numeric_tensor::NumericTensor;
use std::time::Instant;

pub trait SessionObserver {
    fn on_node_executed(&mut self, node: GraphNodeId, start_instant: Instant, end_instant: Instant);
    fn on_value_assigned(&mut self, node: GraphNodeId, value: &NumericTensor);
}

impl SessionObserver for () {
    fn on_node_executed(&mut self, _node: GraphNodeId, _start_instant: Instant, _end_instant: Instant) {
    }
    fn on_value_assigned(&mut self, _node: GraphNodeId, _value: &NumericTensor) {}
}
