//! Native build graph parser.
//!
//! Reads the JSON target description emitted by GN-style build tools:
//!
//! ```json
//! {"targets": {"//app:app": {"type": "executable", "deps": ["//base:base"], "sources": ["//app/main.cc"]}}}
//! ```
//!
//! Every target except `group` becomes a node. Groups are collapsed: a
//! dependency on a group becomes a dependency on each of its members. The
//! relation of a dependency edge follows the dependency's target type, and
//! each listed source becomes a file node reached over `sources`.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;

use super::traits::{FormatConfidence, GraphParser, ParseContext};
use crate::error::{LicscopeError, ParseErrorKind, Result};
use crate::graph::{Node, NodeId, NodeKind, Relation};
use crate::license::ParsedExpression;

const GROUP: &str = "group";

#[derive(Debug, Deserialize)]
struct BuildGraph {
    targets: IndexMap<String, BuildTarget>,
}

#[derive(Debug, Deserialize)]
struct BuildTarget {
    #[serde(rename = "type")]
    target_type: String,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    public_deps: Vec<String>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    testonly: bool,
    /// Optional license expression attached by the build description
    license: Option<String>,
}

impl BuildTarget {
    fn all_deps(&self) -> impl DoubleEndedIterator<Item = &String> {
        self.deps.iter().chain(&self.public_deps)
    }
}

/// Parser for GN-style `{"targets": {...}}` build graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBuildParser;

impl NativeBuildParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve `label` to concrete targets, expanding groups.
    fn expand<'g>(graph: &'g BuildGraph, label: &'g str, context: &str) -> Result<Vec<&'g str>> {
        let mut resolved = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![label];

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let target = graph.targets.get(current).ok_or_else(|| {
                LicscopeError::parse(
                    format!("dependency of {context}"),
                    ParseErrorKind::DanglingEdge(current.to_string()),
                )
            })?;
            if target.target_type == GROUP {
                stack.extend(target.all_deps().rev().map(String::as_str));
            } else {
                resolved.push(current);
            }
        }
        Ok(resolved)
    }

    fn is_skipped(&self, target: &BuildTarget, ctx: &ParseContext<'_>) -> bool {
        target.target_type == GROUP || (target.testonly && ctx.options().skip_testonly)
    }
}

impl GraphParser for NativeBuildParser {
    fn name(&self) -> &'static str {
        "native"
    }

    fn detect(&self, content: &str) -> FormatConfidence {
        if !content.trim_start().starts_with('{') || !content.contains("\"targets\"") {
            return FormatConfidence::NONE;
        }
        if content.contains("\"type\"") {
            FormatConfidence::HIGH
        } else {
            FormatConfidence::LOW
        }
    }

    fn parse_str(&self, content: &str, ctx: &mut ParseContext<'_>) -> Result<()> {
        let graph: BuildGraph = serde_json::from_str(content)?;

        for (label, target) in &graph.targets {
            if self.is_skipped(target, ctx) {
                continue;
            }
            let parsed = match &target.license {
                Some(text) => ctx.parse_license(text, &format!("target {label}"))?,
                None => ParsedExpression::default(),
            };
            let mut node = Node::new(label.as_str(), target_kind(&target.target_type))
                .with_parser(self.name())
                .with_metadata("type", &target.target_type)
                .with_license(parsed.expr)
                .with_warnings(parsed.warnings);
            if let Some(dir) = label_directory(label) {
                node = node.with_path(dir);
            }
            ctx.graph_mut().add_node(node);
        }

        let mut edges = 0usize;
        for (label, target) in &graph.targets {
            if self.is_skipped(target, ctx) {
                continue;
            }
            let source = NodeId::new(label.as_str());

            for dep in target.all_deps() {
                for resolved in Self::expand(&graph, dep, label)? {
                    let dep_target = &graph.targets[resolved];
                    if dep_target.testonly && ctx.options().skip_testonly {
                        continue;
                    }
                    let relation = dependency_relation(&dep_target.target_type);
                    let added = ctx
                        .graph_mut()
                        .add_edge(&source, &NodeId::new(resolved), relation, self.name())?;
                    edges += usize::from(added.is_some());
                }
            }

            for file in &target.sources {
                let id = NodeId::new(file.as_str());
                if !ctx.graph().contains_node(&id) {
                    let path = file.trim_start_matches("//");
                    ctx.graph_mut().add_node(
                        Node::new(id.clone(), NodeKind::File)
                            .with_label(path)
                            .with_path(path)
                            .with_parser(self.name()),
                    );
                }
                let added = ctx
                    .graph_mut()
                    .add_edge(&source, &id, Relation::Sources, self.name())?;
                edges += usize::from(added.is_some());
            }
        }

        tracing::debug!(
            targets = graph.targets.len(),
            nodes = ctx.graph().node_count(),
            edges,
            "Parsed native build graph"
        );
        Ok(())
    }
}

fn target_kind(target_type: &str) -> NodeKind {
    match target_type {
        "shared_library" | "loadable_module" => NodeKind::NativeLib,
        "static_library" | "source_set" | "rust_library" => NodeKind::Library,
        _ => NodeKind::Module,
    }
}

fn dependency_relation(target_type: &str) -> Relation {
    match target_type {
        "shared_library" | "loadable_module" => Relation::LinksDynamic,
        "static_library" | "source_set" | "rust_library" => Relation::LinksStatic,
        _ => Relation::Depends,
    }
}

/// Source directory of a build label: `//base/util:util` is `base/util`.
fn label_directory(label: &str) -> Option<String> {
    let without_toolchain = label.split('(').next().unwrap_or(label);
    let dir = without_toolchain
        .strip_prefix("//")?
        .split(':')
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    Some(if dir.is_empty() { ".".to_string() } else { dir.to_string() })
}
