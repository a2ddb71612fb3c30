use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use waypoint_core::{
    CompiledGraph, InMemoryCheckpointStore, PartialUpdate, RunState, StateGraph, StateSchema, END,
};

/// A chain of `len` nodes, each appending one entry to `log`
fn chain(len: usize) -> StateGraph {
    let schema = StateSchema::new().sequence("log").unwrap();
    let mut graph = StateGraph::new(schema);
    for i in 0..len {
        let name = format!("node_{i}");
        graph
            .add_node(name.clone(), move |_state| {
                let entry = i as i64;
                async move { Ok(PartialUpdate::new().set("log", entry).into()) }
            })
            .unwrap();
        if i > 0 {
            graph.add_edge(format!("node_{}", i - 1), name).unwrap();
        }
    }
    graph.add_edge(format!("node_{}", len - 1), END).unwrap();
    graph.set_entry_point("node_0");
    graph
}

fn linear_execution_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("linear chain");

    for len in [4usize, 16, 64] {
        let app: CompiledGraph = chain(len).compile().unwrap();
        group.bench_with_input(BenchmarkId::new("invoke", len), &app, |b, app| {
            b.to_async(&runtime).iter(|| async {
                app.invoke("bench", black_box(RunState::new())).await.unwrap();
            });
        });

        let persisted = chain(len)
            .compile_with_checkpointer(Arc::new(InMemoryCheckpointStore::new()))
            .unwrap();
        group.bench_with_input(
            BenchmarkId::new("invoke+checkpoint", len),
            &persisted,
            |b, app| {
                b.to_async(&runtime).iter(|| async {
                    app.invoke("bench", black_box(RunState::new())).await.unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, linear_execution_benchmark);
criterion_main!(benches);
