//! Integration tests for pair and edge inference.

use licscope::graph::{LicenseGraph, Node, NodeId, NodeKind, Relation};
use licscope::infer::{InferenceEngine, KnowledgeGraph, Resolution, Verdict};
use licscope::infer::InferenceOutcome;
use licscope::license::{parse_expression, LicenseExpr, UnknownLicenseWarning};
use licscope::resolver::resolve;
use licscope::rules::RuleStore;

fn expr(text: &str) -> LicenseExpr {
    parse_expression(text).unwrap()
}

fn verdict(source: &str, target: &str, relation: Relation, permissive: bool) -> Verdict {
    let rules = RuleStore::embedded().unwrap();
    let knowledge = KnowledgeGraph::new(permissive);
    InferenceEngine::new(&rules, &knowledge, permissive)
        .infer_pair(Some(&expr(source)), Some(&expr(target)), relation)
        .verdict
}

#[test]
fn test_static_linking_copyleft_needs_review() {
    assert_eq!(
        verdict("MIT", "GPL-2.0-only", Relation::LinksStatic, false),
        Verdict::NeedsReview
    );
    assert_eq!(
        verdict("MIT", "GPL-2.0-only", Relation::LinksDynamic, false),
        Verdict::Compatible
    );
}

#[test]
fn test_proprietary_static_copyleft_incompatible() {
    assert_eq!(
        verdict("LicenseRef-Proprietary", "GPL-3.0-only", Relation::LinksStatic, false),
        Verdict::Incompatible
    );
}

#[test]
fn test_exception_relaxes_static_linking() {
    assert_eq!(
        verdict(
            "MIT",
            "GPL-2.0-only WITH Classpath-exception-2.0",
            Relation::LinksStatic,
            false
        ),
        Verdict::Compatible
    );
}

#[test]
fn test_or_takes_best_and_takes_worst() {
    let or = verdict("MIT", "GPL-2.0-only OR Apache-2.0", Relation::LinksStatic, false);
    let and = verdict("MIT", "GPL-2.0-only AND Apache-2.0", Relation::LinksStatic, false);
    assert_eq!(or, Verdict::Compatible);
    assert_eq!(and, Verdict::NeedsReview);
}

#[test]
fn test_unknown_license_strict_vs_permissive() {
    let rules = RuleStore::embedded().unwrap();
    let knowledge = KnowledgeGraph::new(false);
    let strict = InferenceEngine::new(&rules, &knowledge, false).infer_pair(
        Some(&expr("MIT")),
        Some(&expr("Foo-Custom-1.0")),
        Relation::Depends,
    );
    assert_eq!(strict.verdict, Verdict::NeedsReview);
    assert_eq!(strict.warnings.len(), 1);

    assert_eq!(
        verdict("MIT", "Foo-Custom-1.0", Relation::Depends, true),
        Verdict::Compatible
    );
}

#[test]
fn test_unknown_id_inside_and() {
    let rules = RuleStore::embedded().unwrap();
    let target = expr("Foo-1.0 AND GPL-2.0-only");

    let permissive_kg = KnowledgeGraph::new(true);
    let permissive = InferenceEngine::new(&rules, &permissive_kg, true).infer_pair(
        Some(&expr("MIT")),
        Some(&target),
        Relation::LinksStatic,
    );
    assert_eq!(permissive.verdict, Verdict::NeedsReview);
    assert!(permissive.warnings.is_empty());

    let strict_kg = KnowledgeGraph::new(false);
    let strict = InferenceEngine::new(&rules, &strict_kg, false).infer_pair(
        Some(&expr("MIT")),
        Some(&target),
        Relation::LinksStatic,
    );
    assert_eq!(strict.verdict, Verdict::NeedsReview);
    assert_eq!(strict.warnings, vec![UnknownLicenseWarning::license("Foo-1.0")]);
}

#[test]
fn test_unknown_id_inside_or() {
    assert_eq!(
        verdict("MIT", "Foo-1.0 OR GPL-2.0-only", Relation::LinksStatic, true),
        Verdict::Compatible
    );
    assert_eq!(
        verdict("MIT", "Foo-1.0 OR GPL-2.0-only", Relation::LinksStatic, false),
        Verdict::NeedsReview
    );

    let rules = RuleStore::embedded().unwrap();
    let knowledge = KnowledgeGraph::new(false);
    let strict = InferenceEngine::new(&rules, &knowledge, false).infer_pair(
        Some(&expr("MIT")),
        Some(&expr("Foo-1.0 OR Zlib")),
        Relation::LinksStatic,
    );
    assert_eq!(strict.verdict, Verdict::Compatible);
    assert_eq!(strict.warnings, vec![UnknownLicenseWarning::license("Foo-1.0")]);
}

#[test]
fn test_second_lookup_hits_knowledge_graph() {
    let rules = RuleStore::embedded().unwrap();
    let knowledge = KnowledgeGraph::new(false);
    let engine = InferenceEngine::new(&rules, &knowledge, false);

    let first = engine.infer_pair(Some(&expr("MIT")), Some(&expr("Zlib")), Relation::LinksStatic);
    let lookups = rules.action_lookups();
    let second = engine.infer_pair(Some(&expr("MIT")), Some(&expr("Zlib")), Relation::LinksStatic);

    assert_eq!(first.resolution, Resolution::Computed);
    assert_eq!(second.resolution, Resolution::CacheHit);
    assert_eq!(first.verdict, second.verdict);
    assert_eq!(rules.action_lookups(), lookups);
}

#[test]
fn test_infer_all_keeps_edge_order() {
    let mut graph = LicenseGraph::new();
    for (id, license) in [
        ("app", Some("MIT")),
        ("a", Some("GPL-3.0-only")),
        ("b", Some("Apache-2.0")),
        ("c", None),
    ] {
        graph.add_node(Node::new(id, NodeKind::Library).with_license(license.map(expr)));
    }
    let app = NodeId::new("app");
    for target in ["a", "b", "c"] {
        graph
            .add_edge(&app, &NodeId::new(target), Relation::LinksStatic, "test")
            .unwrap();
    }

    let rules = RuleStore::embedded().unwrap();
    let knowledge = KnowledgeGraph::new(false);
    let outcome = InferenceEngine::new(&rules, &knowledge, false).infer_all(&graph);

    let verdicts: Vec<Verdict> = outcome.edges.iter().map(|edge| edge.verdict).collect();
    assert_eq!(
        verdicts,
        vec![Verdict::NeedsReview, Verdict::Compatible, Verdict::Unknown]
    );
    assert_eq!(outcome.counts.total(), 3);
    assert_eq!(outcome.overall(), Verdict::NeedsReview);
    assert!(outcome.nodes.iter().any(|node| node.node.as_str() == "c"));
}

fn chain(links: &[(&str, Option<&str>)], relations: &[Relation]) -> LicenseGraph {
    let mut graph = LicenseGraph::new();
    for (id, license) in links {
        graph.add_node(Node::new(*id, NodeKind::Library).with_license(license.map(expr)));
    }
    for (pair, relation) in links.windows(2).zip(relations) {
        graph
            .add_edge(&NodeId::new(pair[0].0), &NodeId::new(pair[1].0), *relation, "test")
            .unwrap();
    }
    graph
}

fn infer_all(graph: &LicenseGraph) -> InferenceOutcome {
    let rules = RuleStore::embedded().unwrap();
    let knowledge = KnowledgeGraph::new(false);
    InferenceEngine::new(&rules, &knowledge, false).infer_all(graph)
}

#[test]
fn test_exception_conflict_degrades_edge() {
    let mut graph = LicenseGraph::new();
    for (id, license) in [
        ("app", "MIT"),
        ("lib", "GPL-2.0-only WITH Classpath-exception-2.0"),
        ("syscalls", "GPL-2.0-only WITH Linux-syscall-note"),
    ] {
        graph.add_node(Node::new(id, NodeKind::Library).with_license(Some(expr(license))));
    }
    graph
        .add_edge(&NodeId::new("app"), &NodeId::new("lib"), Relation::LinksDynamic, "test")
        .unwrap();

    let rules = RuleStore::embedded().unwrap();
    let report = resolve(&mut graph, &rules, &[]);
    assert!(report.exceptions.conflicts > 0);

    let outcome = infer_all(&graph);
    let edge = outcome.edge(0).unwrap();
    assert_eq!(edge.verdict, Verdict::NeedsReview);
    assert_eq!(edge.conflicts.len(), 1);
    assert_eq!(edge.conflicts[0].existing, "Classpath-exception-2.0");
    assert!(outcome
        .nodes
        .iter()
        .any(|node| node.node.as_str() == "lib" && node.reason == "conflicting exceptions"));
}

#[test]
fn test_copyleft_propagates_through_static_chain() {
    let graph = chain(
        &[
            ("app", Some("LicenseRef-Proprietary")),
            ("wrapper", Some("MIT")),
            ("readline", Some("GPL-3.0-only")),
        ],
        &[Relation::LinksStatic, Relation::LinksStatic],
    );
    let outcome = infer_all(&graph);

    let verdicts: Vec<Verdict> = outcome.edges.iter().map(|edge| edge.verdict).collect();
    assert_eq!(verdicts, vec![Verdict::Compatible, Verdict::NeedsReview]);
    assert_eq!(outcome.overall(), Verdict::Incompatible);

    let inherited = outcome
        .nodes
        .iter()
        .find(|node| node.node.as_str() == "app")
        .unwrap();
    assert_eq!(inherited.verdict, Verdict::Incompatible);
    assert!(inherited.reason.contains("GPL-3.0-only"));
    assert!(inherited.reason.contains("wrapper"));
}

#[test]
fn test_copyleft_propagates_to_every_ancestor() {
    let graph = chain(
        &[
            ("app", Some("LicenseRef-Proprietary")),
            ("framework", Some("MIT")),
            ("wrapper", Some("MIT")),
            ("readline", Some("GPL-3.0-only")),
        ],
        &[Relation::LinksStatic, Relation::Sources, Relation::LinksStatic],
    );
    let outcome = infer_all(&graph);

    let flagged: Vec<(&str, Verdict)> = outcome
        .nodes
        .iter()
        .map(|node| (node.node.as_str(), node.verdict))
        .collect();
    assert!(flagged.contains(&("framework", Verdict::NeedsReview)));
    assert!(flagged.contains(&("app", Verdict::Incompatible)));
}

#[test]
fn test_dynamic_link_stops_propagation() {
    let graph = chain(
        &[
            ("app", Some("LicenseRef-Proprietary")),
            ("wrapper", Some("MIT")),
            ("readline", Some("GPL-3.0-only")),
        ],
        &[Relation::LinksDynamic, Relation::LinksStatic],
    );
    let outcome = infer_all(&graph);

    assert!(outcome.nodes.is_empty());
    assert_eq!(outcome.overall(), Verdict::NeedsReview);
}

#[test]
fn test_exception_stops_propagation() {
    let graph = chain(
        &[
            ("app", Some("LicenseRef-Proprietary")),
            ("wrapper", Some("MIT")),
            ("runtime", Some("GPL-2.0-only WITH Classpath-exception-2.0")),
        ],
        &[Relation::LinksStatic, Relation::LinksStatic],
    );
    let outcome = infer_all(&graph);

    assert!(outcome.nodes.is_empty());
    assert_eq!(outcome.overall(), Verdict::Compatible);
}

#[test]
fn test_node_terms_checked_against_each_other() {
    let mut graph = LicenseGraph::new();
    for (id, license) in [
        ("gpl-apache", "GPL-2.0-only AND Apache-2.0"),
        ("either", "(GPL-2.0-only AND Apache-2.0) OR MIT"),
        ("mixed", "MIT AND GPL-2.0-only"),
        ("closed", "LicenseRef-Proprietary AND GPL-3.0-only"),
    ] {
        graph.add_node(Node::new(id, NodeKind::File).with_license(Some(expr(license))));
    }
    let outcome = infer_all(&graph);

    let flagged: Vec<(&str, Verdict)> = outcome
        .nodes
        .iter()
        .map(|node| (node.node.as_str(), node.verdict))
        .collect();
    assert_eq!(
        flagged,
        vec![
            ("gpl-apache", Verdict::NeedsReview),
            ("closed", Verdict::Incompatible),
        ]
    );
    assert!(outcome
        .nodes
        .iter()
        .all(|node| node.reason == "license terms conflict with each other"));
    assert_eq!(outcome.overall(), Verdict::Incompatible);
}
