//! **License-compatibility inference over software dependency graphs.**
//!
//! `licscope` reads build graphs, SBOMs and file-scanner output, merges them
//! into one typed dependency graph and decides for every edge whether the
//! license of the component that uses something is compatible with the
//! license of what it uses.
//!
//! ## Key Features
//!
//! - **Multiple inputs**: SPDX 2.x and CycloneDX JSON, GN-style native build
//!   graphs and ScanCode JSON, with content-based format detection.
//! - **SPDX expressions**: parsed into a normalized tree; `AND` demands every
//!   operand is compatible, `OR` needs one.
//! - **Rule tables**: per-relation action tables (`deps`, `sources`,
//!   `links-static`, `links-dynamic`) selecting by license id or family,
//!   embedded by default and overridable with a rules directory.
//! - **Scope resolution**: directory LICENSE files and license exceptions are
//!   folded into node licenses before inference.
//! - **Knowledge graph**: every pair verdict is memoized and can be persisted
//!   across runs.
//!
//! ## Core Modules
//!
//! - **[`license`]**: the expression model and parser.
//! - **[`rules`]**: the [`RuleStore`] with license records, exceptions and
//!   action tables.
//! - **[`graph`]**: the [`LicenseGraph`] multigraph, cycle detection and the
//!   canonical JSON exchange format.
//! - **[`resolver`]**: LICENSE-scope and exception resolution.
//! - **[`infer`]**: the [`InferenceEngine`], [`KnowledgeGraph`] and
//!   [`RunContext`].
//! - **[`pipeline`]**: one call that runs every stage.
//!
//! ## Getting Started
//!
//! ```no_run
//! use licscope::config::AnalysisConfig;
//! use licscope::pipeline::{run_analysis, AnalysisInput};
//! use licscope::RunContext;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = RunContext::new(AnalysisConfig::default())?;
//!     let result = run_analysis(&ctx, &[AnalysisInput::detect("build_graph.json")])?;
//!
//!     for finding in &result.report.findings {
//!         println!("[{}] {} -> {}", finding.verdict, finding.source, finding.target);
//!     }
//!     println!("overall: {}", result.report.overall);
//!     Ok(())
//! }
//! ```
//!
//! ### Checking a single pair
//!
//! ```no_run
//! use licscope::graph::Relation;
//! use licscope::license::parse_expression;
//! use licscope::{InferenceEngine, KnowledgeGraph, RuleStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rules = RuleStore::embedded()?;
//!     let knowledge = KnowledgeGraph::new(false);
//!     let engine = InferenceEngine::new(&rules, &knowledge, false);
//!
//!     let app = parse_expression("MIT")?;
//!     let lib = parse_expression("GPL-2.0-only WITH Classpath-exception-2.0")?;
//!     let pair = engine.infer_pair(Some(&app), Some(&lib), Relation::LinksStatic);
//!     println!("{}", pair.verdict);
//!     Ok(())
//! }
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! The `licscope` binary wraps [`pipeline::run_analysis`] in a `check`
//! subcommand with CI-friendly exit codes; see the project README.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Config records legitimately use several bools for toggle flags
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod infer;
pub mod license;
pub mod parsers;
pub mod pipeline;
pub mod reports;
pub mod resolver;
pub mod rules;

// Re-export main types for convenience
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigError, Validatable};
pub use error::{ErrorContext, LicscopeError, Result};
pub use graph::{LicenseGraph, Node, NodeId, NodeKind, Relation};
pub use infer::{InferenceEngine, InferenceOutcome, KnowledgeGraph, RunContext, Verdict};
pub use license::{parse_expression, ExpressionParser, LicenseExpr, LicenseTerm};
pub use parsers::{GraphParser, ParseContext, Parser, ParserKind};
pub use pipeline::{run_analysis, AnalysisInput, PipelineResult};
pub use reports::{AnalysisReport, ReportFormat, ReportGenerator};
pub use resolver::{LicenseScope, ResolveReport};
pub use rules::RuleStore;
