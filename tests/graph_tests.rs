//! Integration tests for graph assembly, cycle detection and canonical JSON.

use licscope::error::LicscopeError;
use licscope::graph::{LicenseGraph, Node, NodeId, NodeKind, Relation};
use licscope::license::parse_expression;

fn node(id: &str) -> Node {
    Node::new(id, NodeKind::Module)
}

fn id(id: &str) -> NodeId {
    NodeId::new(id)
}

#[test]
fn test_two_node_cycle_path() {
    let mut graph = LicenseGraph::new();
    graph.add_node(node("A"));
    graph.add_node(node("B"));
    graph.add_edge(&id("A"), &id("B"), Relation::Depends, "test").unwrap();
    graph.add_edge(&id("B"), &id("A"), Relation::Depends, "test").unwrap();

    assert_eq!(graph.detect_cycle(), Some(vec![id("A"), id("B"), id("A")]));
    let err = graph.ensure_acyclic().unwrap_err();
    assert!(err.is_cycle());
    assert!(err.to_string().contains("A -> B -> A"));
}

#[test]
fn test_diamond_is_acyclic() {
    let mut graph = LicenseGraph::new();
    for name in ["top", "left", "right", "bottom"] {
        graph.add_node(node(name));
    }
    for (from, to) in [("top", "left"), ("top", "right"), ("left", "bottom"), ("right", "bottom")] {
        graph.add_edge(&id(from), &id(to), Relation::LinksStatic, "test").unwrap();
    }
    assert_eq!(graph.detect_cycle(), None);
    assert!(graph.ensure_acyclic().is_ok());
    assert_eq!(graph.roots().count(), 1);
}

#[test]
fn test_parallel_edges_with_distinct_relations() {
    let mut graph = LicenseGraph::new();
    graph.add_node(node("a"));
    graph.add_node(node("b"));
    assert_eq!(graph.add_edge(&id("a"), &id("b"), Relation::Depends, "x").unwrap(), Some(0));
    assert_eq!(graph.add_edge(&id("a"), &id("b"), Relation::LinksStatic, "x").unwrap(), Some(1));
    assert_eq!(graph.add_edge(&id("a"), &id("b"), Relation::Depends, "y").unwrap(), None);
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn test_dangling_edge_rejected() {
    let mut graph = LicenseGraph::new();
    graph.add_node(node("a"));
    let err = graph
        .add_edge(&id("a"), &id("missing"), Relation::Depends, "test")
        .unwrap_err();
    assert!(matches!(err, LicscopeError::Parse { .. }));
}

#[test]
fn test_canonical_round_trip() {
    let mut graph = LicenseGraph::new();
    graph.add_node(
        Node::new("//app:app", NodeKind::Module)
            .with_path("app")
            .with_parser("native")
            .with_license(Some(parse_expression("MIT OR Apache-2.0").unwrap()))
            .with_metadata("type", "executable"),
    );
    graph.add_node(Node::new("//app/main.cc", NodeKind::File).with_path("app/main.cc"));
    graph.add_node(Node::new("//lib:ssl", NodeKind::NativeLib));
    graph
        .add_edge(&id("//app:app"), &id("//app/main.cc"), Relation::Sources, "native")
        .unwrap();
    graph
        .add_edge(&id("//app:app"), &id("//lib:ssl"), Relation::LinksDynamic, "native")
        .unwrap();

    let json = graph.to_canonical_json().unwrap();
    let parsed = LicenseGraph::from_canonical_json(&json).unwrap();

    assert_eq!(parsed.node_count(), 3);
    assert_eq!(parsed.edge_count(), 2);
    assert_eq!(parsed.fingerprint(), graph.fingerprint());
    let app = parsed.node(&id("//app:app")).unwrap();
    assert_eq!(app.path.as_deref(), Some("app"));
    assert_eq!(app.metadata.get("type").map(String::as_str), Some("executable"));
    assert!(app.license().unwrap().equivalent(&parse_expression("Apache-2.0 OR MIT").unwrap()));
    assert_eq!(parsed.edges_by_relation(Relation::LinksDynamic).count(), 1);
}

#[test]
fn test_canonical_import_rejects_unknown_label() {
    let json = r#"{
        "directed": true,
        "multigraph": true,
        "nodes": [{"id": "a", "type": "module"}, {"id": "b", "type": "module"}],
        "edges": [{"source": "a", "target": "b", "label": "includes"}]
    }"#;
    assert!(LicenseGraph::from_canonical_json(json).is_err());
}

#[test]
fn test_subgraph_under_prefix_is_component_aware() {
    let mut graph = LicenseGraph::new();
    for (name, path) in [("a", "lib/a.c"), ("b", "libfoo/b.c"), ("c", "lib")] {
        graph.add_node(Node::new(name, NodeKind::File).with_path(path));
    }
    let mut under: Vec<&str> = graph
        .subgraph_under_prefix("lib")
        .map(|node| node.id.as_str())
        .collect();
    under.sort_unstable();
    assert_eq!(under, vec!["a", "c"]);
    assert_eq!(graph.subgraph_under_prefix(".").count(), 3);
}
