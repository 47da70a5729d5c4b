use opgraph::{
    Add, Graph, GraphNodeId, MatMul, NumericTensor, Placeholder, Session, SessionObserver, Variable,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct TimingObserver {
    graph: Graph,
    timings: Vec<(GraphNodeId, Duration)>,
}

impl SessionObserver for TimingObserver {
    fn on_node_executed(&mut self, node: GraphNodeId, start_instant: Instant, end_instant: Instant) {
        self.timings.push((node, end_instant - start_instant));
    }

    fn on_value_assigned(&mut self, node: GraphNodeId, value: &NumericTensor) {
        let name = self.graph.node_name(node).unwrap_or_default();
        println!("  {name} {:?} = {value}", node.index());
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let graph = Graph::new();
    graph.set_as_default();

    // z = A x + b
    let a = Variable::new(Some(NumericTensor::from_rows(vec![
        vec![1.0f32, 0.5],
        vec![-1.0, 2.0],
    ])?))?;
    let b = Variable::new(Some(NumericTensor::from_vec(vec![0.25f32, -0.25])))?;
    let x = Placeholder::new()?;
    let z = Add::new(MatMul::new(a, x)?, b)?;

    println!(
        "Graph has {} placeholders, {} variables, {} operations",
        graph.placeholders().len(),
        graph.variables().len(),
        graph.operations().len()
    );

    let session = Session::new(&graph);
    for input in [vec![1.0f32, 0.0], vec![0.0, 1.0], vec![2.0, -3.0]] {
        let feed = HashMap::from([(x, NumericTensor::from_vec(input))]);
        let mut observer = TimingObserver {
            graph: graph.clone(),
            timings: Vec::new(),
        };
        let result = session.run_with_observer(z, &feed, &mut observer)?;
        let total: Duration = observer.timings.iter().map(|(_, d)| *d).sum();
        println!("z = {result} ({} nodes in {total:?})", observer.timings.len());
    }

    // Reassigning a variable is visible to later runs
    graph.set_variable_value(b, Some(NumericTensor::from_vec(vec![0.0f32, 0.0])))?;
    let feed = HashMap::from([(x, NumericTensor::from_vec(vec![1.0f32, 1.0]))]);
    println!("z = {}", session.run(z, &feed)?);

    Ok(())
}
