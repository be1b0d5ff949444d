//! Graph assembly stage.
//!
//! Every input lands in one [`ParseContext`]; canonical graphs exported by an
//! earlier run are merged in as-is.

use std::path::{Path, PathBuf};

use crate::error::{ErrorContext, LicscopeError, Result};
use crate::graph::LicenseGraph;
use crate::infer::RunContext;
use crate::parsers::{parse_file, ParseContext, ParserKind};
use crate::resolver::LicenseScope;

/// How an input file should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Pick the parser by content
    Detect,
    /// Use the given parser
    Format(ParserKind),
    /// Canonical node-link graph JSON
    CanonicalGraph,
}

/// One input file of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisInput {
    pub path: PathBuf,
    pub kind: InputKind,
}

impl AnalysisInput {
    #[must_use]
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: InputKind::Detect,
        }
    }

    #[must_use]
    pub fn with_parser(path: impl Into<PathBuf>, kind: ParserKind) -> Self {
        Self {
            path: path.into(),
            kind: InputKind::Format(kind),
        }
    }

    #[must_use]
    pub fn canonical_graph(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: InputKind::CanonicalGraph,
        }
    }
}

/// Output of the assembly stage.
#[derive(Debug)]
pub struct AssembledGraph {
    pub graph: LicenseGraph,
    /// LICENSE scopes reported by scanners
    pub scopes: Vec<LicenseScope>,
    /// Input paths with the parser that read them, e.g. `scan.json (scancode)`
    pub inputs: Vec<String>,
}

/// Parse every input into one graph.
///
/// # Errors
///
/// Returns the first parse or IO error; the failing input is named in the
/// error context.
pub fn assemble_graph(ctx: &RunContext, inputs: &[AnalysisInput]) -> Result<AssembledGraph> {
    if inputs.is_empty() {
        return Err(LicscopeError::validation("no input files given"));
    }

    let mut parse_ctx = ParseContext::new(
        ctx.rules(),
        ctx.permissive_unknown(),
        ctx.config().parsing.clone(),
    );
    let mut described = Vec::with_capacity(inputs.len());

    for input in inputs {
        let parser_name = match input.kind {
            InputKind::Detect => parse_file(&input.path, None, &mut parse_ctx)?.name(),
            InputKind::Format(kind) => parse_file(&input.path, Some(kind), &mut parse_ctx)?.name(),
            InputKind::CanonicalGraph => {
                merge_canonical_graph(&input.path, &mut parse_ctx)?;
                "graph"
            }
        };
        described.push(format!("{} ({parser_name})", input.path.display()));
    }

    let (graph, scopes) = parse_ctx.into_parts();
    tracing::info!(
        inputs = inputs.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        scanner_scopes = scopes.len(),
        "Assembled graph"
    );
    Ok(AssembledGraph {
        graph,
        scopes,
        inputs: described,
    })
}

fn merge_canonical_graph(path: &Path, ctx: &mut ParseContext<'_>) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|e| LicscopeError::io(path, e))?;
    let imported = LicenseGraph::from_canonical_json_with(&text, |license, context| {
        ctx.parse_license(license, context)
    })
    .with_context(|| format!("canonical graph {}", path.display()))?;
    tracing::info!(
        nodes = imported.node_count(),
        edges = imported.edge_count(),
        "Imported {}",
        path.display()
    );
    ctx.graph_mut().extend(imported)
}
