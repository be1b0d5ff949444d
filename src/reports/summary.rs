//! Summary report generator for shell output.
//!
//! Provides a compact, human-readable summary for terminal usage.

use super::{AnalysisReport, ReportError, ReportFormat, ReportGenerator};
use crate::infer::Verdict;

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

const fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Compatible => "green",
        Verdict::Unknown => "dim",
        Verdict::NeedsReview => "yellow",
        Verdict::Incompatible => "red",
    }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    /// Use colored output
    colored: bool,
    /// Maximum findings listed (all when None)
    max_findings: Option<usize>,
}

impl SummaryReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            colored: true,
            max_findings: Some(50),
        }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    #[must_use]
    pub const fn max_findings(mut self, max: Option<usize>) -> Self {
        self.max_findings = max;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }

    fn verdict(&self, verdict: Verdict) -> String {
        self.color(verdict.as_str(), verdict_color(verdict))
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate(&self, report: &AnalysisReport) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        let counts = &report.outcome.counts;

        lines.push(self.color("License Compatibility Summary", "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));

        if !report.metadata.inputs.is_empty() {
            lines.push(format!(
                "{}  {}",
                self.color("Inputs:", "cyan"),
                report.metadata.inputs.join(", ")
            ));
        }
        lines.push(format!(
            "{}   {} nodes ({} licensed), {} edges",
            self.color("Graph:", "cyan"),
            report.graph.nodes,
            report.graph.licensed_nodes,
            report.graph.edges
        ));
        lines.push(format!(
            "{} {} LICENSE scopes, {} merges; {} exception applications, {} conflicts",
            self.color("Resolve:", "cyan"),
            report.resolution.scopes.scopes,
            report.resolution.scopes.merged,
            report.resolution.exceptions.applied,
            report.resolution.exceptions.conflicts
        ));
        lines.push(format!(
            "{}  {} computed, {} from knowledge graph",
            self.color("Cache:", "cyan"),
            report.outcome.computed,
            report.outcome.cache_hits
        ));
        lines.push(String::new());

        lines.push(self.color("Edges:", "bold"));
        for (verdict, count) in [
            (Verdict::Compatible, counts.compatible),
            (Verdict::Unknown, counts.unknown),
            (Verdict::NeedsReview, counts.needs_review),
            (Verdict::Incompatible, counts.incompatible),
        ] {
            lines.push(format!("  {:<14} {count}", self.verdict(verdict)));
        }

        if !report.findings.is_empty() {
            lines.push(String::new());
            lines.push(self.color("Findings:", "bold"));
            let limit = self.max_findings.unwrap_or(report.findings.len());
            for finding in report.findings.iter().take(limit) {
                lines.push(format!(
                    "  [{}] {} -> {} ({})",
                    self.verdict(finding.verdict),
                    finding.source,
                    finding.target,
                    finding.relation
                ));
                lines.push(format!(
                    "      {} -> {}",
                    finding.source_license.as_deref().unwrap_or("<none>"),
                    finding.target_license.as_deref().unwrap_or("<none>")
                ));
                for warning in &finding.warnings {
                    lines.push(self.color(&format!("      warning: {warning}"), "dim"));
                }
                for conflict in &finding.conflicts {
                    lines.push(self.color(&format!("      conflict: {conflict}"), "yellow"));
                }
            }
            if report.findings.len() > limit {
                lines.push(self.color(
                    &format!("  ... and {} more", report.findings.len() - limit),
                    "dim",
                ));
            }
        }

        if !report.outcome.nodes.is_empty() {
            lines.push(String::new());
            lines.push(self.color("Nodes:", "bold"));
            for node in &report.outcome.nodes {
                lines.push(format!(
                    "  [{}] {}: {}",
                    self.verdict(node.verdict),
                    node.node,
                    node.reason
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "{} {}",
            self.color("Overall:", "bold"),
            self.verdict(report.overall)
        ));

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}
