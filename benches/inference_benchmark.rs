//! Performance benchmarks for graph inference.
//!
//! Run with: cargo bench --bench inference_benchmark
//!
//! Measures edge inference with a cold and a warm knowledge graph, scope
//! resolution and expression parsing.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use licscope::graph::{LicenseGraph, Node, NodeId, NodeKind, Relation};
use licscope::infer::{InferenceEngine, KnowledgeGraph};
use licscope::license::parse_expression;
use licscope::resolver::resolve;
use licscope::rules::RuleStore;
use std::hint::black_box;

const LICENSES: &[&str] = &[
    "MIT",
    "Apache-2.0",
    "BSD-3-Clause",
    "MIT OR Apache-2.0",
    "LGPL-2.1-or-later",
    "GPL-2.0-only WITH Classpath-exception-2.0",
    "MPL-2.0",
    "Zlib AND BSD-2-Clause",
];

const RELATIONS: [Relation; 4] = [
    Relation::Depends,
    Relation::LinksStatic,
    Relation::LinksDynamic,
    Relation::Sources,
];

/// Layered graph: every node depends on up to three nodes of the next layer.
fn generate_graph(count: usize) -> LicenseGraph {
    let mut graph = LicenseGraph::new();
    for i in 0..count {
        let license = parse_expression(LICENSES[i % LICENSES.len()]).unwrap();
        graph.add_node(
            Node::new(format!("//pkg{}:lib{i}", i / 16), NodeKind::Library)
                .with_path(format!("pkg{}", i / 16))
                .with_license(Some(license)),
        );
    }

    let ids: Vec<NodeId> = graph.node_ids().cloned().collect();
    for (i, source) in ids.iter().enumerate() {
        for offset in 1..=3 {
            let target = i + offset * 7;
            if target < ids.len() {
                let relation = RELATIONS[(i + offset) % RELATIONS.len()];
                graph.add_edge(source, &ids[target], relation, "bench").unwrap();
            }
        }
    }

    graph.add_node(
        Node::new("//pkg0/LICENSE", NodeKind::File)
            .with_path("pkg0/LICENSE")
            .with_license(Some(parse_expression("BSD-3-Clause").unwrap())),
    );
    graph
}

fn bench_infer_all(c: &mut Criterion) {
    let rules = RuleStore::embedded().unwrap();
    let mut group = c.benchmark_group("infer_all");

    for size in [500, 5_000] {
        let graph = generate_graph(size);

        group.bench_with_input(BenchmarkId::new("cold", size), &graph, |b, graph| {
            b.iter(|| {
                let knowledge = KnowledgeGraph::new(false);
                let engine = InferenceEngine::new(&rules, &knowledge, false);
                black_box(engine.infer_all(black_box(graph)))
            });
        });

        let warm = KnowledgeGraph::new(false);
        InferenceEngine::new(&rules, &warm, false).infer_all(&graph);
        group.bench_with_input(BenchmarkId::new("warm", size), &graph, |b, graph| {
            let engine = InferenceEngine::new(&rules, &warm, false);
            b.iter(|| black_box(engine.infer_all(black_box(graph))));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let rules = RuleStore::embedded().unwrap();
    let graph = generate_graph(5_000);

    c.bench_function("resolve_5000", |b| {
        b.iter_batched(
            || graph.clone(),
            |mut graph| black_box(resolve(&mut graph, &rules, &[])),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_parse_expression(c: &mut Criterion) {
    let text = "(MIT OR Apache-2.0) AND (BSD-3-Clause OR GPL-2.0-only WITH Classpath-exception-2.0) AND Zlib";
    c.bench_function("parse_expression", |b| {
        b.iter(|| black_box(parse_expression(black_box(text))));
    });
}

criterion_group!(benches, bench_infer_all, bench_resolve, bench_parse_expression);
criterion_main!(benches);
