//! Canonical node-link JSON exchange format.
//!
//! ```json
//! {
//!   "directed": true,
//!   "multigraph": true,
//!   "nodes": [{"id": "//app:main", "label": "main", "parser_name": "native", "type": "module"}],
//!   "edges": [{"source": "//app:main", "target": "//base:base", "key": 0,
//!              "parser_name": "native", "label": "links-static"}]
//! }
//! ```
//!
//! `links` is accepted as an alias of `edges` on import.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::manager::LicenseGraph;
use super::types::{Node, NodeId, NodeKind, Relation};
use crate::error::{ErrorContext, LicscopeError, ParseErrorKind, Result};
use crate::license::{is_no_license, parse_expression, ParsedExpression};

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalGraph {
    #[serde(default = "default_true")]
    pub directed: bool,
    #[serde(default = "default_true")]
    pub multigraph: bool,
    pub nodes: Vec<CanonicalNode>,
    #[serde(default, alias = "links")]
    pub edges: Vec<CanonicalEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub parser_name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub key: usize,
    #[serde(default)]
    pub parser_name: String,
    pub label: String,
}

impl From<&LicenseGraph> for CanonicalGraph {
    fn from(graph: &LicenseGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| CanonicalNode {
                id: node.id.to_string(),
                label: Some(node.label.clone()),
                parser_name: node.parser_name.clone(),
                kind: node.kind,
                path: node.path.clone(),
                license: node.license().map(ToString::to_string),
                metadata: node.metadata.clone(),
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .map(|edge| CanonicalEdge {
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                key: edge.key,
                parser_name: edge.parser_name.clone(),
                label: edge.relation.as_str().to_string(),
            })
            .collect();

        Self {
            directed: true,
            multigraph: true,
            nodes,
            edges,
        }
    }
}

impl CanonicalGraph {
    /// Build a graph, parsing node licenses with `parse_license`.
    ///
    /// `parse_license` receives the expression text and a context naming the
    /// node; warnings it returns are attached to the node.
    ///
    /// # Errors
    ///
    /// Returns a parse error for undirected graphs, unknown relation labels,
    /// edges with missing endpoints and any error of `parse_license`.
    pub fn into_graph<F>(self, mut parse_license: F) -> Result<LicenseGraph>
    where
        F: FnMut(&str, &str) -> Result<ParsedExpression>,
    {
        if !self.directed {
            return Err(LicscopeError::parse(
                "canonical graph",
                ParseErrorKind::InvalidValue {
                    field: "directed".to_string(),
                    message: "only directed graphs are supported".to_string(),
                },
            ));
        }

        let mut graph = LicenseGraph::new();
        for raw in self.nodes {
            let parsed = match raw.license.as_deref() {
                Some(text) if !is_no_license(text) => parse_license(text, &format!("node {}", raw.id))?,
                _ => ParsedExpression::default(),
            };
            let mut node = Node::new(raw.id.as_str(), raw.kind)
                .with_label(raw.label.unwrap_or_else(|| raw.id.clone()))
                .with_parser(raw.parser_name)
                .with_license(parsed.expr)
                .with_warnings(parsed.warnings);
            node.path = raw.path;
            node.metadata = raw.metadata;
            graph.add_node(node);
        }

        for raw in self.edges {
            let relation = raw
                .label
                .parse::<Relation>()
                .with_context(|| format!("edge {} -> {}", raw.source, raw.target))?;
            graph.add_edge(
                &NodeId::new(raw.source),
                &NodeId::new(raw.target),
                relation,
                &raw.parser_name,
            )?;
        }

        Ok(graph)
    }
}

/// Strict import: malformed license text is an error, unknown ids are kept.
fn parse_strict(text: &str, context: &str) -> Result<ParsedExpression> {
    let expr = parse_expression(text.trim()).context(context)?;
    Ok(ParsedExpression {
        expr: Some(expr),
        warnings: Vec::new(),
    })
}

impl TryFrom<CanonicalGraph> for LicenseGraph {
    type Error = LicscopeError;

    fn try_from(canonical: CanonicalGraph) -> Result<Self> {
        canonical.into_graph(parse_strict)
    }
}

impl LicenseGraph {
    /// Serialize to canonical JSON.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails.
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&CanonicalGraph::from(self))?)
    }

    /// Parse canonical JSON, validating labels and endpoints.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed JSON, unknown relation labels,
    /// malformed license expressions or edges with missing endpoints.
    pub fn from_canonical_json(text: &str) -> Result<Self> {
        Self::from_canonical_json_with(text, parse_strict)
    }

    /// Parse canonical JSON with a custom license parser, see
    /// [`CanonicalGraph::into_graph`].
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed JSON or any error of
    /// [`CanonicalGraph::into_graph`].
    pub fn from_canonical_json_with<F>(text: &str, parse_license: F) -> Result<Self>
    where
        F: FnMut(&str, &str) -> Result<ParsedExpression>,
    {
        let canonical: CanonicalGraph =
            serde_json::from_str(text).context("canonical graph")?;
        canonical.into_graph(parse_license)
    }

    /// Content fingerprint of the canonical form
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        serde_json::to_vec(&CanonicalGraph::from(self))
            .map(|bytes| xxh3_64(&bytes))
            .unwrap_or_default()
    }
}
