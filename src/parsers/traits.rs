//! Parser trait and the shared parse context.
//!
//! Every input format implements [`GraphParser`]: it reads one document and
//! adds nodes, edges and LICENSE scopes to a [`ParseContext`]. Several inputs
//! can feed the same context, so a native build graph can be annotated by a
//! later ScanCode result.

use std::path::Path;

use crate::config::ParsingConfig;
use crate::error::{ErrorContext, LicscopeError, Result};
use crate::graph::LicenseGraph;
use crate::license::{is_no_license, parse_expression, ExpressionParser, ParsedExpression};
use crate::resolver::LicenseScope;
use crate::rules::RuleStore;

/// Confidence level for format detection
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    /// Definitely not this format
    pub const NONE: Self = Self(0.0);
    /// Might be this format
    pub const LOW: Self = Self(0.25);
    /// Likely this format
    pub const MEDIUM: Self = Self(0.5);
    /// Almost certainly this format
    pub const HIGH: Self = Self(0.75);
    /// Definitely this format
    pub const CERTAIN: Self = Self(1.0);

    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Check if this confidence indicates the format can be parsed
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.0 >= Self::LOW.0
    }
}

impl Default for FormatConfidence {
    fn default() -> Self {
        Self::NONE
    }
}

/// State shared by all parsers of one run.
pub struct ParseContext<'a> {
    graph: LicenseGraph,
    scopes: Vec<LicenseScope>,
    rules: &'a RuleStore,
    permissive: bool,
    options: ParsingConfig,
}

impl<'a> ParseContext<'a> {
    #[must_use]
    pub fn new(rules: &'a RuleStore, permissive: bool, options: ParsingConfig) -> Self {
        Self {
            graph: LicenseGraph::new(),
            scopes: Vec::new(),
            rules,
            permissive,
            options,
        }
    }

    #[must_use]
    pub const fn graph(&self) -> &LicenseGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut LicenseGraph {
        &mut self.graph
    }

    #[must_use]
    pub const fn rules(&self) -> &'a RuleStore {
        self.rules
    }

    #[must_use]
    pub const fn options(&self) -> &ParsingConfig {
        &self.options
    }

    #[must_use]
    pub fn scopes(&self) -> &[LicenseScope] {
        &self.scopes
    }

    /// Record a LICENSE scope; a second scope for the same file replaces
    /// nothing and is dropped.
    pub fn add_scope(&mut self, scope: LicenseScope) {
        if self
            .scopes
            .iter()
            .any(|known| known.license_file == scope.license_file)
        {
            tracing::debug!("Duplicate LICENSE scope {}", scope.license_file);
            return;
        }
        self.scopes.push(scope);
    }

    /// Parse a license expression found in an input document.
    ///
    /// In permissive mode unknown ids and malformed text become `Unknown`
    /// leaves with warnings. Otherwise syntax errors are fatal and unknown ids
    /// are kept as-is, so inference can flag every edge they touch.
    ///
    /// # Errors
    ///
    /// Returns a parse error carrying `context` for malformed expressions in
    /// strict mode.
    pub fn parse_license(&self, text: &str, context: &str) -> Result<ParsedExpression> {
        if self.permissive {
            return ExpressionParser::new(self.rules, true).parse(text);
        }
        if is_no_license(text) {
            return Ok(ParsedExpression::default());
        }
        let expr = parse_expression(text.trim()).context(context)?;
        Ok(ParsedExpression {
            expr: Some(expr),
            warnings: Vec::new(),
        })
    }

    /// Finish parsing.
    #[must_use]
    pub fn into_parts(self) -> (LicenseGraph, Vec<LicenseScope>) {
        (self.graph, self.scopes)
    }
}

/// Trait for input format parsers.
///
/// Implementors provide format detection via `detect()` and parsing via
/// `parse_str()`.
pub trait GraphParser {
    /// Name recorded as `parser_name` on the nodes and edges produced
    fn name(&self) -> &'static str;

    /// Lightweight structural check of `content`
    fn detect(&self, content: &str) -> FormatConfidence;

    /// Parse one document into `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed documents.
    fn parse_str(&self, content: &str, ctx: &mut ParseContext<'_>) -> Result<()>;

    /// Parse a file into `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the file cannot be read, or any error of
    /// [`GraphParser::parse_str`].
    fn parse(&self, path: &Path, ctx: &mut ParseContext<'_>) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| LicscopeError::io(path, e))?;
        self.parse_str(&content, ctx)
            .with_context(|| format!("{} input {}", self.name(), path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_threshold() {
        assert!(FormatConfidence::LOW.can_parse());
        assert!(!FormatConfidence::new(0.1).can_parse());
        assert_eq!(FormatConfidence::new(3.0), FormatConfidence::CERTAIN);
    }

    #[test]
    fn test_parse_license_modes() {
        let rules = RuleStore::embedded().unwrap();

        let strict = ParseContext::new(&rules, false, ParsingConfig::default());
        let parsed = strict.parse_license("Foo-1.0 AND MIT", "test").unwrap();
        assert_eq!(parsed.expr.unwrap().to_string(), "Foo-1.0 AND MIT");
        assert!(strict.parse_license("MIT AND", "test").is_err());
        assert!(strict.parse_license("NOASSERTION", "test").unwrap().expr.is_none());

        let permissive = ParseContext::new(&rules, true, ParsingConfig::default());
        let parsed = permissive.parse_license("MIT AND", "test").unwrap();
        assert!(parsed.expr.unwrap().has_unknown());
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_duplicate_scope_dropped() {
        let rules = RuleStore::embedded().unwrap();
        let mut ctx = ParseContext::new(&rules, false, ParsingConfig::default());
        let expr = parse_expression("MIT").unwrap();
        ctx.add_scope(LicenseScope::for_file("LICENSE", expr.clone()));
        ctx.add_scope(LicenseScope::for_file("LICENSE", expr));
        assert_eq!(ctx.scopes().len(), 1);
    }
}
