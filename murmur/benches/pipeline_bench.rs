//! Benchmarks for validation, scheduling and execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use murmur::config::ConfigBag;
use murmur::pipeline::{schedule, validate, GraphExecutor, NodeDefinition, PipelineDefinition, Wiring};
use murmur::stages::StageRegistry;
use murmur::testing::MockStage;
use std::sync::Arc;

/// Builds `layers` layers of `width` nodes, each reading every node of the
/// previous layer through a list input.
fn layered_pipeline(layers: usize, width: usize) -> PipelineDefinition {
    let mut definition = PipelineDefinition::new("layered");
    for layer in 0..layers {
        for slot in 0..width {
            let mut node = NodeDefinition::new(format!("l{layer}_{slot}"), "relay");
            if layer > 0 {
                let upstream = (0..width).map(|prev| Wiring::node(format!("l{}_{prev}", layer - 1), "value"));
                node = node.with_input("x", Wiring::list(upstream));
            }
            definition = definition.with_node(node);
        }
    }
    definition
}

fn registry() -> StageRegistry {
    let registry = StageRegistry::new();
    registry.register(Arc::new(MockStage::new("relay").with_inputs(["x"]).with_outputs(["value"])));
    registry
}

fn pipeline_benchmark(c: &mut Criterion) {
    let registry = registry();
    let definition = layered_pipeline(10, 20);

    c.bench_function("validate_and_schedule_200_nodes", |b| {
        b.iter(|| {
            let validated = validate(black_box(&definition), &registry).unwrap();
            black_box(schedule(validated.graph()).unwrap())
        });
    });

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = ConfigBag::new();
    c.bench_function("execute_200_nodes", |b| {
        b.iter(|| {
            runtime
                .block_on(GraphExecutor::new(&registry).execute(&definition, &config))
                .unwrap()
        });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
