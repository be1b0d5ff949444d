//! Output handling for reports and exported graphs.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::error::LicscopeError;
use crate::graph::LicenseGraph;

/// Target for output - either stdout or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout
    Stdout,
    /// Write to a file
    File(PathBuf),
}

impl OutputTarget {
    /// Create output target from optional path
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => Self::File(p),
            None => Self::Stdout,
        }
    }

    /// Check if output is to a terminal
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stdout) && std::io::stdout().is_terminal()
    }
}

/// Determine if color should be used based on flags, target and environment
#[must_use]
pub fn should_use_color(no_color_flag: bool, target: &OutputTarget) -> bool {
    !no_color_flag && target.is_terminal() && std::env::var("NO_COLOR").is_err()
}

/// Write output to the target (stdout or file)
pub fn write_output(content: &str, target: &OutputTarget, quiet: bool) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            println!("{content}");
            Ok(())
        }
        OutputTarget::File(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            if !quiet {
                tracing::info!("Report written to {}", path.display());
            }
            Ok(())
        }
    }
}

/// Write the canonical JSON form of `graph` to `path`.
///
/// # Errors
///
/// Returns an IO error when the file cannot be written.
pub fn export_graph(graph: &LicenseGraph, path: &Path) -> crate::error::Result<()> {
    let json = graph.to_canonical_json()?;
    std::fs::write(path, json).map_err(|e| LicscopeError::io(path, e))?;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Exported canonical graph to {}",
        path.display()
    );
    Ok(())
}
