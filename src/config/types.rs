//! Configuration types for licscope runs.
//!
//! A single [`AnalysisConfig`] record describes one analysis run. It can be
//! built from CLI arguments, a YAML config file, or both (with CLI overriding
//! file settings).

use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::default_kg_path;

// ============================================================================
// Analysis Configuration
// ============================================================================

/// Configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Treat unknown license ids as compatible instead of flagging them for review
    pub permissive_unknown: bool,
    /// Ignore any persisted knowledge graph and recompute every verdict
    pub reinfer: bool,
    /// Persist the knowledge graph at the end of the run
    pub save_kg: bool,
    /// Knowledge graph file (defaults to the user cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kg_path: Option<PathBuf>,
    /// Directory overriding the embedded rule resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_dir: Option<PathBuf>,
    /// Input parsing options
    pub parsing: ParsingConfig,
    /// Output options
    pub output: OutputConfig,
}

impl AnalysisConfig {
    /// Create a new `AnalysisConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AnalysisConfig` builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Knowledge graph file used by this run.
    ///
    /// An explicit `kg_path` always wins. Otherwise the default cache location
    /// is used only when the run saves the knowledge graph.
    #[must_use]
    pub fn effective_kg_path(&self) -> Option<PathBuf> {
        match &self.kg_path {
            Some(path) => Some(path.clone()),
            None if self.save_kg => default_kg_path(),
            None => None,
        }
    }
}

// ============================================================================
// Builder for AnalysisConfig
// ============================================================================

/// Builder for constructing `AnalysisConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub const fn permissive_unknown(mut self, permissive: bool) -> Self {
        self.config.permissive_unknown = permissive;
        self
    }

    pub const fn reinfer(mut self, reinfer: bool) -> Self {
        self.config.reinfer = reinfer;
        self
    }

    pub const fn save_kg(mut self, save: bool) -> Self {
        self.config.save_kg = save;
        self
    }

    /// Set the knowledge graph file.
    pub fn kg_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.kg_path = path;
        self
    }

    /// Set the rules directory.
    pub fn rules_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.rules_dir = dir;
        self
    }

    /// Skip `testonly` targets in native build graphs.
    pub const fn skip_testonly(mut self, skip: bool) -> Self {
        self.config.parsing.skip_testonly = skip;
        self
    }

    /// Strip ScanCode `LicenseRef-scancode-` prefixes and language suffixes.
    pub const fn strip_scancode_refs(mut self, strip: bool) -> Self {
        self.config.parsing.strip_scancode_refs = strip;
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Export the resolved canonical graph to a file.
    pub fn export_graph(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.export_graph = file;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AnalysisConfig {
        self.config
    }
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// Input parsing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ParsingConfig {
    /// Skip native build targets marked `testonly`
    pub skip_testonly: bool,
    /// Rewrite ScanCode-specific license references to plain ids
    pub strip_scancode_refs: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            skip_testonly: false,
            strip_scancode_refs: true,
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Write the resolved canonical graph to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_graph: Option<PathBuf>,
}
