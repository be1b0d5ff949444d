//! Pipeline orchestration for analysis runs.
//!
//! One run is: assemble → cycle check → resolve → infer → report. The CLI
//! handlers and library users share this module so the stages always run in
//! the same order.

mod assemble;
mod output;

pub use assemble::{assemble_graph, AnalysisInput, AssembledGraph, InputKind};
pub use output::{export_graph, should_use_color, write_output, OutputTarget};

use std::path::PathBuf;

use crate::error::Result;
use crate::graph::LicenseGraph;
use crate::infer::{RunContext, Verdict};
use crate::reports::{AnalysisReport, ReportMetadata};
use crate::resolver;

/// Exit codes for CI/CD integration
pub mod exit_codes {
    use crate::infer::Verdict;

    /// Every edge is compatible
    pub const SUCCESS: i32 = 0;
    /// Some edge needs review or has unknown licensing
    pub const NEEDS_REVIEW: i32 = 1;
    /// An incompatible edge was found
    pub const INCOMPATIBLE: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;

    /// Exit code for the overall verdict of a run
    #[must_use]
    pub const fn for_verdict(verdict: Verdict) -> i32 {
        match verdict {
            Verdict::Compatible => SUCCESS,
            Verdict::Unknown | Verdict::NeedsReview => NEEDS_REVIEW,
            Verdict::Incompatible => INCOMPATIBLE,
        }
    }
}

/// Result of a complete analysis run.
#[derive(Debug)]
pub struct PipelineResult {
    pub report: AnalysisReport,
    /// Graph after exception and scope resolution
    pub graph: LicenseGraph,
    /// Knowledge graph file written by this run
    pub saved_knowledge: Option<PathBuf>,
}

impl PipelineResult {
    #[must_use]
    pub const fn overall(&self) -> Verdict {
        self.report.overall
    }

    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        exit_codes::for_verdict(self.report.overall)
    }
}

/// Run every stage over `inputs`.
///
/// When `output.export_graph` is configured the resolved graph is written as
/// canonical JSON. Scanner scopes are already merged into it, and resolving
/// an imported graph again leaves its licenses unchanged.
///
/// # Errors
///
/// Returns parse and IO errors from assembly, a cycle error when the graph is
/// not acyclic and IO errors from graph export or knowledge graph persistence.
pub fn run_analysis(ctx: &RunContext, inputs: &[AnalysisInput]) -> Result<PipelineResult> {
    let AssembledGraph {
        mut graph,
        scopes,
        inputs: described,
    } = assemble_graph(ctx, inputs)?;

    graph.ensure_acyclic()?;

    let resolution = resolver::resolve(&mut graph, ctx.rules(), &scopes);

    if let Some(path) = &ctx.config().output.export_graph {
        export_graph(&graph, path)?;
    }

    let outcome = ctx.engine().infer_all(&graph);
    tracing::info!(
        edges = outcome.edges.len(),
        computed = outcome.computed,
        cache_hits = outcome.cache_hits,
        overall = %outcome.overall(),
        "Inferred verdicts"
    );

    let metadata = ReportMetadata::new(described, ctx.permissive_unknown(), &graph);
    let report = AnalysisReport::new(metadata, &graph, resolution, outcome);

    let saved_knowledge = ctx.finish()?;
    if let Some(path) = &saved_knowledge {
        tracing::info!(
            entries = ctx.knowledge().len(),
            "Saved knowledge graph to {}",
            path.display()
        );
    }

    Ok(PipelineResult {
        report,
        graph,
        saved_knowledge,
    })
}
