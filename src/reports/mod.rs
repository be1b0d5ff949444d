//! Report generation for analysis results.
//!
//! Two output formats are provided:
//! - JSON: the complete [`AnalysisReport`] for programmatic integration
//! - Summary: compact shell-friendly output

mod json;
mod summary;
mod types;

pub use json::JsonReporter;
pub use summary::SummaryReporter;
pub use types::{AnalysisReport, Finding, GraphStats, ReportFormat, ReportMetadata};

use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Render a report
    fn generate(&self, report: &AnalysisReport) -> Result<String, ReportError>;

    /// Write a report to a writer
    fn write_report(&self, report: &AnalysisReport, writer: &mut dyn Write) -> Result<(), ReportError> {
        let text = self.generate(report)?;
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    create_reporter_with_options(format, true)
}

/// Create a report generator with color control
#[must_use]
pub fn create_reporter_with_options(format: ReportFormat, use_color: bool) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Summary => {
            if use_color {
                Box::new(SummaryReporter::new())
            } else {
                Box::new(SummaryReporter::new().no_color())
            }
        }
        ReportFormat::Json => Box::new(JsonReporter::new()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::{LicenseGraph, Node, NodeId, NodeKind, Relation};
    use crate::infer::{InferenceEngine, KnowledgeGraph};
    use crate::license::parse_expression;
    use crate::resolver::ResolveReport;
    use crate::rules::RuleStore;

    /// `app (MIT)` statically links `gpl (GPL-2.0-only)` and depends on
    /// `zlib (Zlib)`.
    pub(crate) fn sample_report() -> AnalysisReport {
        let mut graph = LicenseGraph::new();
        for (id, license) in [("app", "MIT"), ("gpl", "GPL-2.0-only"), ("zlib", "Zlib")] {
            graph.add_node(
                Node::new(id, NodeKind::Library).with_license(Some(parse_expression(license).unwrap())),
            );
        }
        let app = NodeId::new("app");
        graph
            .add_edge(&app, &NodeId::new("gpl"), Relation::LinksStatic, "test")
            .unwrap();
        graph
            .add_edge(&app, &NodeId::new("zlib"), Relation::Depends, "test")
            .unwrap();

        let rules = RuleStore::embedded().unwrap();
        let knowledge = KnowledgeGraph::new(false);
        let outcome = InferenceEngine::new(&rules, &knowledge, false).infer_all(&graph);
        let metadata = ReportMetadata::new(vec!["build.json".to_string()], false, &graph);
        AnalysisReport::new(metadata, &graph, ResolveReport::default(), outcome)
    }

    #[test]
    fn test_report_findings() {
        let report = sample_report();
        assert_eq!(report.graph.edges, 2);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].target.as_str(), "gpl");
        assert_eq!(report.findings[0].source_license.as_deref(), Some("MIT"));
    }

    #[test]
    fn test_create_reporter_formats() {
        for format in [ReportFormat::Summary, ReportFormat::Json] {
            assert_eq!(create_reporter(format).format(), format);
        }
    }

    #[test]
    fn test_write_report() {
        let mut buffer = Vec::new();
        create_reporter_with_options(ReportFormat::Summary, false)
            .write_report(&sample_report(), &mut buffer)
            .unwrap();
        assert!(String::from_utf8(buffer).unwrap().ends_with('\n'));
    }
}
