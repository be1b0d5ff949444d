//! End-to-end tests for the analysis pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use licscope::config::AnalysisConfig;
use licscope::graph::LicenseGraph;
use licscope::infer::{Resolution, RunContext, Verdict};
use licscope::parsers::ParserKind;
use licscope::pipeline::{exit_codes, run_analysis, AnalysisInput};
use licscope::reports::{create_reporter_with_options, ReportFormat};
use licscope::rules::RuleStore;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn native_inputs() -> Vec<AnalysisInput> {
    vec![
        AnalysisInput::with_parser(fixture("build_graph.json"), ParserKind::Native),
        AnalysisInput::with_parser(fixture("scancode.json"), ParserKind::Scancode),
    ]
}

#[test]
fn test_native_build_is_compatible_without_tests() {
    let config = AnalysisConfig::builder().skip_testonly(true).build();
    let ctx = RunContext::new(config).unwrap();
    let result = run_analysis(&ctx, &native_inputs()).unwrap();

    assert_eq!(result.overall(), Verdict::Compatible);
    assert_eq!(result.exit_code(), exit_codes::SUCCESS);
    assert!(result.report.findings.is_empty());
    assert_eq!(result.report.resolution.scopes.scopes, 1);
    assert_eq!(result.report.metadata.inputs.len(), 2);
}

#[test]
fn test_testonly_targets_without_license_are_reported() {
    let ctx = RunContext::new(AnalysisConfig::default()).unwrap();
    let result = run_analysis(&ctx, &native_inputs()).unwrap();

    assert_eq!(result.overall(), Verdict::Unknown);
    assert_eq!(result.exit_code(), exit_codes::NEEDS_REVIEW);
    assert!(result
        .report
        .findings
        .iter()
        .all(|finding| finding.source.as_str() == "//app:app_tests"));
}

#[test]
fn test_sbom_incompatibility_exit_code() {
    let ctx = RunContext::new(AnalysisConfig::default()).unwrap();
    let result = run_analysis(&ctx, &[AnalysisInput::detect(fixture("app.spdx.json"))]).unwrap();

    assert_eq!(result.overall(), Verdict::Incompatible);
    assert_eq!(result.exit_code(), exit_codes::INCOMPATIBLE);
    let worst = &result.report.findings[0];
    assert_eq!(worst.target.as_str(), "SPDXRef-readline");
    assert_eq!(worst.verdict, Verdict::Incompatible);

    let summary = create_reporter_with_options(ReportFormat::Summary, false)
        .generate(&result.report)
        .unwrap();
    assert!(summary.contains("Overall: incompatible"));
}

#[test]
fn test_knowledge_graph_reused_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let kg_path = dir.path().join("kg.json");
    let config = AnalysisConfig::builder()
        .save_kg(true)
        .kg_path(Some(kg_path.clone()))
        .skip_testonly(true)
        .build();

    let first_ctx = RunContext::with_rules(config.clone(), Arc::new(RuleStore::embedded().unwrap())).unwrap();
    let first = run_analysis(&first_ctx, &native_inputs()).unwrap();
    assert_eq!(first.saved_knowledge.as_deref(), Some(kg_path.as_path()));
    assert!(first.report.outcome.computed > 0);

    let rules = Arc::new(RuleStore::embedded().unwrap());
    let second_ctx = RunContext::with_rules(config, Arc::clone(&rules)).unwrap();
    let second = run_analysis(&second_ctx, &native_inputs()).unwrap();

    assert_eq!(rules.action_lookups(), 0);
    assert_eq!(second.report.outcome.computed, 0);
    assert!(second
        .report
        .outcome
        .edges
        .iter()
        .all(|edge| edge.resolution != Resolution::Computed));

    let verdicts = |outcome: &licscope::InferenceOutcome| -> Vec<Verdict> {
        outcome.edges.iter().map(|edge| edge.verdict).collect()
    };
    assert_eq!(verdicts(&first.report.outcome), verdicts(&second.report.outcome));
}

#[test]
fn test_reinfer_ignores_saved_knowledge() {
    let dir = tempfile::tempdir().unwrap();
    let kg_path = dir.path().join("kg.json");
    let config = AnalysisConfig::builder()
        .save_kg(true)
        .kg_path(Some(kg_path))
        .build();

    let ctx = RunContext::new(config.clone()).unwrap();
    run_analysis(&ctx, &native_inputs()).unwrap();

    let mut reinfer = config;
    reinfer.reinfer = true;
    let rules = Arc::new(RuleStore::embedded().unwrap());
    let ctx = RunContext::with_rules(reinfer, Arc::clone(&rules)).unwrap();
    let result = run_analysis(&ctx, &native_inputs()).unwrap();

    assert!(rules.action_lookups() > 0);
    assert!(result.report.outcome.computed > 0);
}

#[test]
fn test_exported_graph_can_be_reimported() {
    let dir = tempfile::tempdir().unwrap();
    let exported = dir.path().join("graph.json");
    let config = AnalysisConfig::builder()
        .skip_testonly(true)
        .export_graph(Some(exported.clone()))
        .build();
    let ctx = RunContext::new(config).unwrap();
    let original = run_analysis(&ctx, &native_inputs()).unwrap();

    let text = std::fs::read_to_string(&exported).unwrap();
    assert_eq!(LicenseGraph::from_canonical_json(&text).unwrap().node_count(), original.graph.node_count());

    let ctx = RunContext::new(AnalysisConfig::default()).unwrap();
    let replayed = run_analysis(&ctx, &[AnalysisInput::canonical_graph(&exported)]).unwrap();
    assert_eq!(replayed.report.graph, original.report.graph);
    assert_eq!(replayed.overall(), original.overall());
}

#[test]
fn test_cycle_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle.json");
    std::fs::write(
        &path,
        r#"{"targets": {
            "//a:a": {"type": "static_library", "deps": ["//b:b"]},
            "//b:b": {"type": "static_library", "deps": ["//a:a"]}
        }}"#,
    )
    .unwrap();

    let ctx = RunContext::new(AnalysisConfig::default()).unwrap();
    let err = run_analysis(&ctx, &[AnalysisInput::detect(&path)]).unwrap_err();
    assert!(err.is_cycle());
}
