//! Append-only typed multigraph.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

use super::types::{Edge, Node, NodeId, Relation};
use crate::error::{LicscopeError, ParseErrorKind, Result};

/// Directed multigraph of components and their relations.
///
/// Nodes and edges keep insertion order and are never removed. Only the
/// license bookkeeping of a node can change after insertion, through the
/// crate-internal [`LicenseGraph::node_mut`].
#[derive(Debug, Clone, Default)]
pub struct LicenseGraph {
    nodes: IndexMap<NodeId, Node>,
    edges: Vec<Edge>,
    triples: HashSet<(NodeId, NodeId, Relation)>,
    pair_counts: HashMap<(NodeId, NodeId), usize>,
    outgoing: HashMap<NodeId, Vec<usize>>,
    incoming: HashMap<NodeId, Vec<usize>>,
}

impl LicenseGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Add a node. Returns false, keeping the existing node, on a duplicate id.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            tracing::debug!("Ignoring duplicate node '{}'", node.id);
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Add an edge between existing nodes.
    ///
    /// Returns the index of the new edge, or `None` when the same
    /// `(source, target, relation)` triple already exists.
    ///
    /// # Errors
    ///
    /// Returns a parse error when either endpoint is not in the graph.
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relation: Relation,
        parser_name: &str,
    ) -> Result<Option<usize>> {
        for endpoint in [source, target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(LicscopeError::parse(
                    format!("edge {source} -> {target}"),
                    ParseErrorKind::DanglingEdge(endpoint.to_string()),
                ));
            }
        }

        if !self
            .triples
            .insert((source.clone(), target.clone(), relation))
        {
            return Ok(None);
        }

        let counter = self
            .pair_counts
            .entry((source.clone(), target.clone()))
            .or_insert(0);
        let key = *counter;
        *counter += 1;

        let index = self.edges.len();
        self.edges.push(Edge {
            source: source.clone(),
            target: target.clone(),
            relation,
            key,
            parser_name: parser_name.to_string(),
        });
        self.outgoing.entry(source.clone()).or_default().push(index);
        self.incoming.entry(target.clone()).or_default().push(index);
        Ok(Some(index))
    }

    /// Append every node and edge of `other`; first node wins on duplicate ids.
    ///
    /// # Errors
    ///
    /// Never fails for graphs built through [`LicenseGraph::add_edge`]; the
    /// result type mirrors `add_edge`.
    pub fn extend(&mut self, other: Self) -> Result<()> {
        let Self { nodes, edges, .. } = other;
        for (_, node) in nodes {
            self.add_node(node);
        }
        for edge in edges {
            self.add_edge(&edge.source, &edge.target, edge.relation, &edge.parser_name)?;
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub(crate) fn node_index(&self, id: &NodeId) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    pub(crate) fn node_at(&self, index: usize) -> Option<&Node> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    /// Edges in insertion order
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges leaving `id`
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Edge> {
        self.edge_list(self.outgoing.get(id))
    }

    /// Edges entering `id`
    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &Edge> {
        self.edge_list(self.incoming.get(id))
    }

    fn edge_list<'a>(&'a self, indices: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a Edge> {
        indices
            .into_iter()
            .flatten()
            .filter_map(|&index| self.edges.get(index))
    }

    /// Nodes without incoming edges
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|node| !self.incoming.contains_key(&node.id))
    }

    /// Edges carrying the given relation
    pub fn edges_by_relation(&self, relation: Relation) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(move |edge| edge.relation == relation)
    }

    /// Nodes whose path lies under `prefix`.
    ///
    /// Matching is per path component: `lib` covers `lib/a.c` but not
    /// `libfoo/a.c`. An empty prefix or `.` covers every node with a path.
    pub fn subgraph_under_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes.values().filter(move |node| {
            node.path
                .as_deref()
                .is_some_and(|path| path_has_prefix(path, prefix))
        })
    }
}

// ============================================================================
// Path prefix helpers
// ============================================================================

fn trim_path(path: &str) -> &str {
    let path = path.trim_start_matches("//").trim_start_matches("./");
    path.trim_matches('/')
}

/// Whether `path` equals `prefix` or lies below it, comparing whole components.
#[must_use]
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = trim_path(prefix);
    if prefix.is_empty() || prefix == "." {
        return true;
    }
    let path = trim_path(path);
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
