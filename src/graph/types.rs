//! Node, edge and relation types of the dependency graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{LicscopeError, ParseErrorKind};
use crate::license::{ExceptionConflict, LicenseExpr, UnknownLicenseWarning};

/// Stable node identifier (build label, SPDX element id or `//`-prefixed path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Component kind.
///
/// Native build target types are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Project,
    #[serde(alias = "executable")]
    Module,
    #[serde(alias = "code", alias = "source")]
    File,
    #[serde(alias = "static_library", alias = "source_set", alias = "rust_library")]
    Library,
    #[serde(alias = "shared_library", alias = "loadable_module")]
    NativeLib,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Module => "module",
            Self::File => "file",
            Self::Library => "library",
            Self::NativeLib => "native-lib",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the source of an edge uses its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "deps", alias = "depends", alias = "DEPENDS_ON")]
    Depends,
    #[serde(rename = "sources", alias = "CONTAINS")]
    Sources,
    #[serde(rename = "links-static", alias = "static", alias = "STATIC_LINK")]
    LinksStatic,
    #[serde(
        rename = "links-dynamic",
        alias = "dynamic",
        alias = "shared",
        alias = "DYNAMIC_LINK"
    )]
    LinksDynamic,
}

impl Relation {
    pub const ALL: [Self; 4] = [
        Self::Depends,
        Self::Sources,
        Self::LinksStatic,
        Self::LinksDynamic,
    ];

    /// Canonical edge label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Depends => "deps",
            Self::Sources => "sources",
            Self::LinksStatic => "links-static",
            Self::LinksDynamic => "links-dynamic",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = LicscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deps" | "depends" | "DEPENDS_ON" => Ok(Self::Depends),
            "sources" | "CONTAINS" => Ok(Self::Sources),
            "links-static" | "static" | "STATIC_LINK" => Ok(Self::LinksStatic),
            "links-dynamic" | "dynamic" | "shared" | "DYNAMIC_LINK" => Ok(Self::LinksDynamic),
            other => Err(LicscopeError::parse(
                "edge label",
                ParseErrorKind::InvalidValue {
                    field: "label".to_string(),
                    message: format!("unknown relation '{other}'"),
                },
            )),
        }
    }
}

/// A component in the dependency graph.
///
/// The license expression is only replaced wholesale, by parsers during
/// assembly and by the resolver afterwards, and is always kept normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    /// Repository-relative path, used for LICENSE scoping
    pub path: Option<String>,
    pub parser_name: String,
    pub metadata: IndexMap<String, String>,
    license: Option<LicenseExpr>,
    applied_scopes: BTreeSet<String>,
    applied_exceptions: BTreeSet<String>,
    exception_conflicts: Vec<ExceptionConflict>,
    warnings: Vec<UnknownLicenseWarning>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        let id = id.into();
        Self {
            label: id.as_str().to_string(),
            id,
            kind,
            path: None,
            parser_name: String::new(),
            metadata: IndexMap::new(),
            license: None,
            applied_scopes: BTreeSet::new(),
            applied_exceptions: BTreeSet::new(),
            exception_conflicts: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser_name: impl Into<String>) -> Self {
        self.parser_name = parser_name.into();
        self
    }

    #[must_use]
    pub fn with_license(mut self, license: Option<LicenseExpr>) -> Self {
        self.license = license.map(|expr| expr.normalize());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<UnknownLicenseWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Current license expression; `None` means unknown.
    #[must_use]
    pub const fn license(&self) -> Option<&LicenseExpr> {
        self.license.as_ref()
    }

    /// LICENSE files already merged into this node
    #[must_use]
    pub const fn applied_scopes(&self) -> &BTreeSet<String> {
        &self.applied_scopes
    }

    /// Exceptions already applied by the resolver
    #[must_use]
    pub const fn applied_exceptions(&self) -> &BTreeSet<String> {
        &self.applied_exceptions
    }

    #[must_use]
    pub fn exception_conflicts(&self) -> &[ExceptionConflict] {
        &self.exception_conflicts
    }

    #[must_use]
    pub fn warnings(&self) -> &[UnknownLicenseWarning] {
        &self.warnings
    }

    /// File name component of the path
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(|path| path.rsplit('/').find(|part| !part.is_empty()))
    }

    pub(crate) fn replace_license(&mut self, license: LicenseExpr) {
        self.license = Some(license.normalize());
    }

    /// AND-merge `expr` into the current license.
    pub(crate) fn merge_license(&mut self, expr: &LicenseExpr) {
        self.license = Some(LicenseExpr::merge_and_opt(self.license.as_ref(), expr));
    }

    /// Record a LICENSE file as merged; false when it already was.
    pub(crate) fn mark_scope(&mut self, license_file: &str) -> bool {
        self.applied_scopes.insert(license_file.to_string())
    }

    /// Record an exception as applied; false when it already was.
    pub(crate) fn mark_exception(&mut self, exception_id: &str) -> bool {
        self.applied_exceptions.insert(exception_id.to_string())
    }

    pub(crate) fn add_conflicts(&mut self, conflicts: impl IntoIterator<Item = ExceptionConflict>) {
        for conflict in conflicts {
            if !self.exception_conflicts.contains(&conflict) {
                self.exception_conflicts.push(conflict);
            }
        }
    }

    pub(crate) fn add_warnings(&mut self, warnings: impl IntoIterator<Item = UnknownLicenseWarning>) {
        for warning in warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
    }
}

/// A typed edge. `key` numbers parallel edges between the same pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
    pub key: usize,
    pub parser_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_aliases() {
        assert_eq!("DEPENDS_ON".parse::<Relation>().unwrap(), Relation::Depends);
        assert_eq!("shared".parse::<Relation>().unwrap(), Relation::LinksDynamic);
        assert_eq!("STATIC_LINK".parse::<Relation>().unwrap(), Relation::LinksStatic);
        assert!("links".parse::<Relation>().is_err());

        let rel: Relation = serde_json::from_str("\"dynamic\"").unwrap();
        assert_eq!(rel, Relation::LinksDynamic);
        assert_eq!(serde_json::to_string(&rel).unwrap(), "\"links-dynamic\"");
    }

    #[test]
    fn test_node_kind_native_aliases() {
        let kind: NodeKind = serde_json::from_str("\"shared_library\"").unwrap();
        assert_eq!(kind, NodeKind::NativeLib);
        let kind: NodeKind = serde_json::from_str("\"executable\"").unwrap();
        assert_eq!(kind, NodeKind::Module);
        assert_eq!(serde_json::to_string(&NodeKind::NativeLib).unwrap(), "\"native-lib\"");
    }

    #[test]
    fn test_node_license_is_normalized() {
        let expr = crate::license::parse_expression("MIT AND Apache-2.0 AND MIT").unwrap();
        let node = Node::new("//a", NodeKind::File).with_license(Some(expr));
        assert_eq!(node.license().unwrap().to_string(), "Apache-2.0 AND MIT");
    }

    #[test]
    fn test_file_name() {
        let node = Node::new("//third_party/zlib/LICENSE", NodeKind::File)
            .with_path("third_party/zlib/LICENSE");
        assert_eq!(node.file_name(), Some("LICENSE"));
        assert_eq!(Node::new("x", NodeKind::File).file_name(), None);
    }
}
