//! LICENSE-file scoping.
//!
//! A license file (`LICENSE`, `LICENCE`, `COPYING`, `COPYRIGHT`, optionally
//! followed by `.ext` or `-suffix`) covers every node under its directory.
//! Its expression is AND-merged into each covered node exactly once.

use serde::{Deserialize, Serialize};

use crate::graph::{LicenseGraph, NodeId, NodeKind};
use crate::license::LicenseExpr;

const LICENSE_FILE_STEMS: &[&str] = &["LICENSE", "LICENCE", "COPYING", "COPYRIGHT"];

/// A directory-wide license declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseScope {
    /// Path of the LICENSE file; identifies the scope
    pub license_file: String,
    /// Directory it covers (`.` for the root)
    pub directory: String,
    pub expr: LicenseExpr,
}

impl LicenseScope {
    /// Scope for a LICENSE file at `path`
    pub fn for_file(path: impl Into<String>, expr: LicenseExpr) -> Self {
        let license_file = path.into();
        Self {
            directory: license_directory(&license_file),
            license_file,
            expr: expr.normalize(),
        }
    }
}

/// Summary of a scope resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeReport {
    pub scopes: usize,
    /// Nodes that received a merge in this pass
    pub merged: usize,
    /// Covered nodes that had already received the scope
    pub already_applied: usize,
}

/// Whether a file name denotes a license file.
#[must_use]
pub fn is_license_file(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    LICENSE_FILE_STEMS.iter().any(|stem| {
        upper
            .strip_prefix(stem)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('-'))
    })
}

/// Parent directory of a path, `.` at the root.
#[must_use]
pub fn license_directory(path: &str) -> String {
    let trimmed = path.trim_start_matches("//").trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) if idx > 0 => trimmed[..idx].to_string(),
        _ => ".".to_string(),
    }
}

/// LICENSE files present in the graph as file nodes with a license.
#[must_use]
pub fn discover_license_scopes(graph: &LicenseGraph) -> Vec<LicenseScope> {
    graph
        .nodes()
        .filter(|node| node.kind == NodeKind::File)
        .filter(|node| node.file_name().is_some_and(is_license_file))
        .filter_map(|node| {
            let path = node.path.as_deref()?;
            let expr = node.license()?;
            Some(LicenseScope::for_file(path, expr.clone()))
        })
        .collect()
}

/// AND-merge each scope into every node under its directory.
///
/// Each node remembers which LICENSE files it has received, so running the
/// pass again, or with scopes in another order, yields the same licenses.
pub fn resolve_license_scopes(graph: &mut LicenseGraph, scopes: &[LicenseScope]) -> ScopeReport {
    let mut report = ScopeReport {
        scopes: scopes.len(),
        ..ScopeReport::default()
    };

    for scope in scopes {
        let covered: Vec<NodeId> = graph
            .subgraph_under_prefix(&scope.directory)
            .map(|node| node.id.clone())
            .collect();

        for id in covered {
            let Some(node) = graph.node_mut(&id) else {
                continue;
            };
            if !node.mark_scope(&scope.license_file) {
                report.already_applied += 1;
                continue;
            }
            node.merge_license(&scope.expr);
            tracing::debug!(
                "{}: merged {} from {}",
                id,
                scope.expr,
                scope.license_file
            );
            report.merged += 1;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use crate::license::parse_expression;

    #[test]
    fn test_license_file_names() {
        for name in ["LICENSE", "LICENSE.txt", "LICENSE-MIT", "COPYING", "Copyright", "LICENCE.md"] {
            assert!(is_license_file(name), "{name}");
        }
        for name in ["LICENSES", "license_check.py", "README", "COPYINGX"] {
            assert!(!is_license_file(name), "{name}");
        }
    }

    #[test]
    fn test_license_directory() {
        assert_eq!(license_directory("LICENSE"), ".");
        assert_eq!(license_directory("//LICENSE"), ".");
        assert_eq!(license_directory("third_party/zlib/LICENSE"), "third_party/zlib");
    }

    #[test]
    fn test_scope_skips_sibling_directories() {
        let mut graph = LicenseGraph::new();
        graph.add_node(Node::new("//a/x.c", NodeKind::File).with_path("a/x.c"));
        graph.add_node(Node::new("//ab/y.c", NodeKind::File).with_path("ab/y.c"));
        let scope = LicenseScope::for_file("a/LICENSE", parse_expression("MIT").unwrap());

        let report = resolve_license_scopes(&mut graph, &[scope]);
        assert_eq!(report.merged, 1);
        assert!(graph.node(&NodeId::new("//ab/y.c")).unwrap().license().is_none());
        assert_eq!(
            graph.node(&NodeId::new("//a/x.c")).unwrap().license().unwrap().to_string(),
            "MIT"
        );
    }
}
