//! Input parsers.
//!
//! Each parser turns one input document into nodes, edges and LICENSE
//! scopes of a shared [`ParseContext`]:
//!
//! - [`SbomParser`]: SPDX 2.x JSON and CycloneDX JSON
//! - [`NativeBuildParser`]: GN-style `{"targets": {...}}` build graphs
//! - [`ScancodeParser`]: ScanCode per-file license detections
//!
//! ## Usage
//!
//! ```no_run
//! use licscope::config::ParsingConfig;
//! use licscope::parsers::{parse_file, ParseContext};
//! use licscope::rules::RuleStore;
//! use std::path::Path;
//!
//! let rules = RuleStore::embedded().unwrap();
//! let mut ctx = ParseContext::new(&rules, false, ParsingConfig::default());
//! parse_file(Path::new("build_graph.json"), None, &mut ctx).unwrap();
//! let (graph, scopes) = ctx.into_parts();
//! ```

mod detection;
mod native;
mod sbom;
mod scancode;
mod traits;

pub use detection::{Parser, ParserKind};
pub use native::NativeBuildParser;
pub use sbom::{canonical_license_id, SbomParser};
pub use scancode::ScancodeParser;
pub use traits::{FormatConfidence, GraphParser, ParseContext};

use crate::error::{ErrorContext, LicscopeError, Result};
use std::path::Path;

/// Maximum input file size (512 MB).
const MAX_INPUT_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Parse a file with the parser for `kind`, or a detected one.
///
/// Returns the kind of parser used.
///
/// # Errors
///
/// Returns an IO error for unreadable or oversized files and a parse error
/// when the format cannot be detected or the document is malformed.
pub fn parse_file(path: &Path, kind: Option<ParserKind>, ctx: &mut ParseContext<'_>) -> Result<ParserKind> {
    let metadata = std::fs::metadata(path).map_err(|e| LicscopeError::io(path, e))?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(LicscopeError::validation(format!(
            "{} is {} MB, exceeding the {} MB limit",
            path.display(),
            metadata.len() / (1024 * 1024),
            MAX_INPUT_FILE_SIZE / (1024 * 1024),
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| LicscopeError::io(path, e))?;

    let parser = match kind {
        Some(kind) => Parser::for_kind(kind),
        None => Parser::detect(&content).with_context(|| path.display().to_string())?,
    };
    parser
        .parse_str(&content, ctx)
        .with_context(|| format!("{} input {}", parser.name(), path.display()))?;

    tracing::info!(
        parser = parser.name(),
        nodes = ctx.graph().node_count(),
        edges = ctx.graph().edge_count(),
        "Parsed {}",
        path.display()
    );
    Ok(parser.kind())
}
