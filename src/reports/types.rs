//! Report data types.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::graph::{LicenseGraph, Node, NodeId, Relation};
use crate::infer::{InferenceOutcome, Verdict};
use crate::license::{ExceptionConflict, UnknownLicenseWarning};
use crate::resolver::ResolveReport;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    /// Brief human-readable summary
    #[default]
    Summary,
    /// Structured JSON output
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Run metadata included in every report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    /// Input files in the order they were parsed
    pub inputs: Vec<String>,
    pub permissive_unknown: bool,
    /// Content hash of the resolved graph (hex xxh3)
    pub graph_fingerprint: String,
}

impl ReportMetadata {
    #[must_use]
    pub fn new(inputs: Vec<String>, permissive_unknown: bool, graph: &LicenseGraph) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            inputs,
            permissive_unknown,
            graph_fingerprint: format!("{:016x}", graph.fingerprint()),
        }
    }
}

/// Size of the analyzed graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Nodes that carry a license expression
    pub licensed_nodes: usize,
}

impl From<&LicenseGraph> for GraphStats {
    fn from(graph: &LicenseGraph) -> Self {
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            licensed_nodes: graph.nodes().filter(|node| node.license().is_some()).count(),
        }
    }
}

/// An edge whose verdict is not `compatible`, with the licenses involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_license: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<UnknownLicenseWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ExceptionConflict>,
}

/// Everything one analysis run reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub overall: Verdict,
    pub graph: GraphStats,
    pub resolution: ResolveReport,
    /// Non-compatible edges, worst first
    pub findings: Vec<Finding>,
    pub outcome: InferenceOutcome,
}

impl AnalysisReport {
    #[must_use]
    pub fn new(
        metadata: ReportMetadata,
        graph: &LicenseGraph,
        resolution: ResolveReport,
        outcome: InferenceOutcome,
    ) -> Self {
        let license_of = |id: &NodeId| {
            graph
                .node(id)
                .and_then(Node::license)
                .map(ToString::to_string)
        };

        let mut findings: Vec<Finding> = outcome
            .edges
            .iter()
            .filter(|edge| !edge.verdict.is_compatible())
            .map(|edge| Finding {
                source: edge.source.clone(),
                target: edge.target.clone(),
                relation: edge.relation,
                verdict: edge.verdict,
                source_license: license_of(&edge.source),
                target_license: license_of(&edge.target),
                warnings: edge.warnings.clone(),
                conflicts: edge.conflicts.clone(),
            })
            .collect();
        findings.sort_by(|a, b| b.verdict.cmp(&a.verdict));

        Self {
            metadata,
            overall: outcome.overall(),
            graph: GraphStats::from(graph),
            resolution,
            findings,
            outcome,
        }
    }
}
