//! SBOM parser for SPDX 2.x JSON and CycloneDX JSON.
//!
//! Packages and components become nodes carrying their declared license;
//! SPDX relationships and CycloneDX `dependencies` become edges. License ids
//! are canonicalized against the SPDX license list before validation, so
//! `Apache 2.0` or the deprecated `GPL-2.0+` resolve to the ids the rule
//! store knows.

use serde::Deserialize;
use std::collections::HashSet;

use super::traits::{FormatConfidence, GraphParser, ParseContext};
use crate::error::{LicscopeError, ParseErrorKind, Result};
use crate::graph::{Node, NodeId, NodeKind, Relation};
use crate::license::{is_no_license, parse_expression, LicenseExpr, ParsedExpression};

/// Parser for SPDX and CycloneDX JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SbomParser;

impl SbomParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn is_spdx(content: &str) -> bool {
        content.contains("\"spdxVersion\"") && content.contains("\"SPDXID\"")
    }

    fn is_cyclonedx(content: &str) -> bool {
        content.contains("\"bomFormat\"") && content.contains("CycloneDX")
    }

    // ========================================================================
    // SPDX
    // ========================================================================

    fn parse_spdx(&self, content: &str, ctx: &mut ParseContext<'_>) -> Result<()> {
        let doc: SpdxDocument = serde_json::from_str(content)?;
        if !doc.spdx_version.starts_with("SPDX-2") {
            return Err(LicscopeError::parse(
                "SPDX document",
                ParseErrorKind::InvalidValue {
                    field: "spdxVersion".to_string(),
                    message: format!("unsupported version {}", doc.spdx_version),
                },
            ));
        }

        let mut described: HashSet<&str> = doc.document_describes.iter().map(String::as_str).collect();
        described.extend(
            doc.relationships
                .iter()
                .filter(|rel| rel.relationship_type == "DESCRIBES")
                .map(|rel| rel.related_spdx_element.as_str()),
        );

        for package in &doc.packages {
            let text = license_text(
                package.license_concluded.as_deref(),
                package.license_declared.as_deref(),
            );
            let kind = if described.contains(package.spdx_id.as_str()) {
                NodeKind::Project
            } else {
                NodeKind::Library
            };
            let mut node = Node::new(package.spdx_id.as_str(), kind).with_label(&package.name);
            if let Some(version) = &package.version_info {
                node = node.with_metadata("version", version);
            }
            self.add_licensed_node(ctx, node, text.as_deref())?;
        }

        for file in &doc.files {
            let text = license_text(file.license_concluded.as_deref(), None).or_else(|| {
                let infos: Vec<&str> = file
                    .license_info_in_files
                    .iter()
                    .map(String::as_str)
                    .filter(|info| !is_no_license(info))
                    .collect();
                (!infos.is_empty()).then(|| infos.join(" AND "))
            });
            let path = file.file_name.trim_start_matches("./");
            let node = Node::new(file.spdx_id.as_str(), NodeKind::File)
                .with_label(path)
                .with_path(path);
            self.add_licensed_node(ctx, node, text.as_deref())?;
        }

        let mut added = 0;
        for rel in &doc.relationships {
            let Some((relation, reversed)) = spdx_relation(&rel.relationship_type) else {
                continue;
            };
            let (source, target) = if reversed {
                (&rel.related_spdx_element, &rel.spdx_element_id)
            } else {
                (&rel.spdx_element_id, &rel.related_spdx_element)
            };
            if self.add_known_edge(ctx, source, target, relation)? {
                added += 1;
            }
        }

        tracing::debug!(
            packages = doc.packages.len(),
            files = doc.files.len(),
            edges = added,
            "Parsed SPDX document"
        );
        Ok(())
    }

    // ========================================================================
    // CycloneDX
    // ========================================================================

    fn parse_cyclonedx(&self, content: &str, ctx: &mut ParseContext<'_>) -> Result<()> {
        let bom: CdxBom = serde_json::from_str(content)?;
        if bom.bom_format != "CycloneDX" {
            return Err(LicscopeError::parse(
                "CycloneDX document",
                ParseErrorKind::InvalidValue {
                    field: "bomFormat".to_string(),
                    message: format!("expected CycloneDX, found {}", bom.bom_format),
                },
            ));
        }

        if let Some(root) = bom.metadata.and_then(|metadata| metadata.component) {
            self.add_component(ctx, &root, NodeKind::Project)?;
        }

        let mut stack: Vec<&CdxComponent> = bom.components.iter().rev().collect();
        while let Some(component) = stack.pop() {
            self.add_component(ctx, component, component_kind(&component.component_type))?;
            stack.extend(component.components.iter().rev());
        }

        for dependency in &bom.dependencies {
            for target in &dependency.depends_on {
                self.add_known_edge(ctx, &dependency.ref_field, target, Relation::Depends)?;
            }
        }
        Ok(())
    }

    fn add_component(&self, ctx: &mut ParseContext<'_>, component: &CdxComponent, kind: NodeKind) -> Result<()> {
        let id = component.bom_ref.clone().unwrap_or_else(|| match &component.version {
            Some(version) => format!("{}@{version}", component.name),
            None => component.name.clone(),
        });

        let mut node = Node::new(id, kind).with_label(&component.name);
        if let Some(version) = &component.version {
            node = node.with_metadata("version", version);
        }
        let text = cyclonedx_license_text(&component.licenses);
        self.add_licensed_node(ctx, node, text.as_deref())
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    fn add_licensed_node(&self, ctx: &mut ParseContext<'_>, node: Node, text: Option<&str>) -> Result<()> {
        let parsed = match text {
            Some(text) => ctx.parse_license(&canonicalize_expression(text), &format!("node {}", node.id))?,
            None => ParsedExpression::default(),
        };
        let node = node
            .with_parser(self.name())
            .with_license(parsed.expr)
            .with_warnings(parsed.warnings);
        ctx.graph_mut().add_node(node);
        Ok(())
    }

    /// Add an edge when both endpoints are nodes of this document.
    fn add_known_edge(
        &self,
        ctx: &mut ParseContext<'_>,
        source: &str,
        target: &str,
        relation: Relation,
    ) -> Result<bool> {
        let source = NodeId::new(source);
        let target = NodeId::new(target);
        if !ctx.graph().contains_node(&source) || !ctx.graph().contains_node(&target) {
            tracing::debug!("Skipping {} edge {} -> {} (no such element)", relation, source, target);
            return Ok(false);
        }
        Ok(ctx.graph_mut().add_edge(&source, &target, relation, self.name())?.is_some())
    }
}

impl GraphParser for SbomParser {
    fn name(&self) -> &'static str {
        "sbom"
    }

    fn detect(&self, content: &str) -> FormatConfidence {
        if !content.trim_start().starts_with('{') {
            return FormatConfidence::NONE;
        }
        if Self::is_spdx(content) || Self::is_cyclonedx(content) {
            FormatConfidence::CERTAIN
        } else if content.contains("\"spdxVersion\"") || content.contains("\"bomFormat\"") {
            FormatConfidence::MEDIUM
        } else {
            FormatConfidence::NONE
        }
    }

    fn parse_str(&self, content: &str, ctx: &mut ParseContext<'_>) -> Result<()> {
        if content.contains("\"spdxVersion\"") {
            self.parse_spdx(content, ctx)
        } else if content.contains("\"bomFormat\"") {
            self.parse_cyclonedx(content, ctx)
        } else {
            Err(LicscopeError::parse(
                "SBOM",
                ParseErrorKind::UnknownFormat("neither SPDX nor CycloneDX JSON".to_string()),
            ))
        }
    }
}

/// Concluded license unless it carries no information, else declared.
fn license_text(concluded: Option<&str>, declared: Option<&str>) -> Option<String> {
    concluded
        .filter(|text| !is_no_license(text))
        .or_else(|| declared.filter(|text| !is_no_license(text)))
        .map(str::to_string)
}

/// Relation and direction for an SPDX relationship type.
fn spdx_relation(kind: &str) -> Option<(Relation, bool)> {
    match kind {
        "DEPENDS_ON" => Some((Relation::Depends, false)),
        "DEPENDENCY_OF" => Some((Relation::Depends, true)),
        "STATIC_LINK" => Some((Relation::LinksStatic, false)),
        "DYNAMIC_LINK" => Some((Relation::LinksDynamic, false)),
        "CONTAINS" => Some((Relation::Sources, false)),
        "CONTAINED_BY" => Some((Relation::Sources, true)),
        _ => None,
    }
}

fn component_kind(component_type: &str) -> NodeKind {
    match component_type {
        "application" => NodeKind::Module,
        "file" => NodeKind::File,
        _ => NodeKind::Library,
    }
}

/// Combine CycloneDX license choices into one expression text.
fn cyclonedx_license_text(choices: &[CdxLicenseChoice]) -> Option<String> {
    let parts: Vec<String> = choices
        .iter()
        .filter_map(|choice| {
            if let Some(expression) = &choice.expression {
                return Some(format!("({expression})"));
            }
            let license = choice.license.as_ref()?;
            license
                .id
                .clone()
                .or_else(|| license.name.as_deref().map(license_ref_for_name))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(" AND "))
}

/// SPDX id for a free-form license name, or a `LicenseRef-` id built from it.
fn license_ref_for_name(name: &str) -> String {
    if let Some((license, consumed)) = spdx::imprecise_license_id(name) {
        if consumed == name.len() {
            return license.name.to_string();
        }
    }
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect();
    format!("LicenseRef-{sanitized}")
}

/// Canonical SPDX spelling of a license id.
///
/// Deprecated bare GNU ids map to their `-only` form and a trailing `+` to
/// `-or-later`. Ids the SPDX list does not know are returned unchanged.
#[must_use]
pub fn canonical_license_id(id: &str) -> String {
    if id.starts_with("LicenseRef-") || id.starts_with("DocumentRef-") {
        return id.to_string();
    }
    let (base, or_later) = match id.strip_suffix('+') {
        Some(base) => (base, true),
        None => (id, false),
    };

    let license = spdx::license_id(base).or_else(|| {
        spdx::imprecise_license_id(base)
            .filter(|(_, consumed)| *consumed == base.len())
            .map(|(license, _)| license)
    });
    let Some(license) = license else {
        return id.to_string();
    };

    let name = license.name;
    if or_later || license.is_deprecated() {
        let stem = name
            .strip_suffix("-only")
            .or_else(|| name.strip_suffix("-or-later"))
            .unwrap_or(name);
        let candidate = format!("{stem}{}", if or_later { "-or-later" } else { "-only" });
        if spdx::license_id(&candidate).is_some() {
            return candidate;
        }
    }
    if or_later {
        format!("{name}+")
    } else {
        name.to_string()
    }
}

/// Rewrite every license id of `text` to its canonical spelling.
///
/// Malformed text is returned unchanged so the caller reports it.
fn canonicalize_expression(text: &str) -> String {
    if is_no_license(text) {
        return text.to_string();
    }
    match parse_expression(text) {
        Ok(expr) => expr
            .map_leaves(|leaf| match leaf {
                LicenseExpr::License(term) => {
                    let mut term = term.clone();
                    term.id = canonical_license_id(&term.id);
                    LicenseExpr::License(term)
                }
                other => other.clone(),
            })
            .to_string(),
        Err(_) => text.to_string(),
    }
}

// ============================================================================
// SPDX JSON structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    spdx_version: String,
    #[serde(default)]
    document_describes: Vec<String>,
    #[serde(default)]
    packages: Vec<SpdxPackage>,
    #[serde(default)]
    files: Vec<SpdxFile>,
    #[serde(default)]
    relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    version_info: Option<String>,
    license_concluded: Option<String>,
    license_declared: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxFile {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    file_name: String,
    license_concluded: Option<String>,
    #[serde(default)]
    license_info_in_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxRelationship {
    spdx_element_id: String,
    relationship_type: String,
    related_spdx_element: String,
}

// ============================================================================
// CycloneDX JSON structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxBom {
    bom_format: String,
    metadata: Option<CdxMetadata>,
    #[serde(default)]
    components: Vec<CdxComponent>,
    #[serde(default)]
    dependencies: Vec<CdxDependency>,
}

#[derive(Debug, Deserialize)]
struct CdxMetadata {
    component: Option<CdxComponent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxComponent {
    #[serde(rename = "type", default)]
    component_type: String,
    #[serde(alias = "bom-ref")]
    bom_ref: Option<String>,
    name: String,
    version: Option<String>,
    #[serde(default)]
    licenses: Vec<CdxLicenseChoice>,
    #[serde(default)]
    components: Vec<CdxComponent>,
}

#[derive(Debug, Deserialize)]
struct CdxLicenseChoice {
    license: Option<CdxLicense>,
    expression: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxLicense {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxDependency {
    #[serde(rename = "ref")]
    ref_field: String,
    #[serde(default)]
    depends_on: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsingConfig;
    use crate::rules::RuleStore;

    const SPDX_DOC: &str = r#"{
        "spdxVersion": "SPDX-2.3",
        "SPDXID": "SPDXRef-DOCUMENT",
        "name": "app",
        "documentDescribes": ["SPDXRef-app"],
        "packages": [
            {"SPDXID": "SPDXRef-app", "name": "app", "licenseConcluded": "NOASSERTION", "licenseDeclared": "MIT"},
            {"SPDXID": "SPDXRef-readline", "name": "readline", "versionInfo": "8.2", "licenseConcluded": "GPL-3.0+"},
            {"SPDXID": "SPDXRef-zlib", "name": "zlib", "licenseConcluded": "Zlib"}
        ],
        "relationships": [
            {"spdxElementId": "SPDXRef-DOCUMENT", "relationshipType": "DESCRIBES", "relatedSpdxElement": "SPDXRef-app"},
            {"spdxElementId": "SPDXRef-app", "relationshipType": "STATIC_LINK", "relatedSpdxElement": "SPDXRef-readline"},
            {"spdxElementId": "SPDXRef-zlib", "relationshipType": "DEPENDENCY_OF", "relatedSpdxElement": "SPDXRef-app"}
        ]
    }"#;

    const CDX_DOC: &str = r#"{
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "metadata": {"component": {"type": "application", "bom-ref": "app", "name": "app",
            "licenses": [{"license": {"id": "Apache-2.0"}}]}},
        "components": [
            {"type": "library", "bom-ref": "pkg:cargo/serde@1.0", "name": "serde", "version": "1.0",
             "licenses": [{"expression": "MIT OR Apache-2.0"}]},
            {"type": "library", "bom-ref": "pkg:npm/left-pad@1.3.0", "name": "left-pad",
             "licenses": [{"license": {"name": "WTFPL"}}]}
        ],
        "dependencies": [
            {"ref": "app", "dependsOn": ["pkg:cargo/serde@1.0", "pkg:npm/left-pad@1.3.0", "missing"]}
        ]
    }"#;

    fn parse(content: &str) -> crate::graph::LicenseGraph {
        let rules = RuleStore::embedded().unwrap();
        let mut ctx = ParseContext::new(&rules, false, ParsingConfig::default());
        SbomParser::new().parse_str(content, &mut ctx).unwrap();
        ctx.into_parts().0
    }

    #[test]
    fn test_canonical_license_id() {
        assert_eq!(canonical_license_id("MIT"), "MIT");
        assert_eq!(canonical_license_id("GPL-2.0"), "GPL-2.0-only");
        assert_eq!(canonical_license_id("GPL-3.0+"), "GPL-3.0-or-later");
        assert_eq!(canonical_license_id("LicenseRef-Proprietary"), "LicenseRef-Proprietary");
        assert_eq!(canonical_license_id("Foo-1.0"), "Foo-1.0");
    }

    #[test]
    fn test_spdx_document() {
        let graph = parse(SPDX_DOC);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let app = graph.node(&NodeId::new("SPDXRef-app")).unwrap();
        assert_eq!(app.kind, NodeKind::Project);
        assert_eq!(app.license().unwrap().to_string(), "MIT");

        let readline = graph.node(&NodeId::new("SPDXRef-readline")).unwrap();
        assert_eq!(readline.license().unwrap().to_string(), "GPL-3.0-or-later");
        assert_eq!(readline.metadata.get("version").map(String::as_str), Some("8.2"));

        let edges = graph.edges();
        assert_eq!(edges[0].relation, Relation::LinksStatic);
        assert_eq!(edges[1].source.as_str(), "SPDXRef-app");
        assert_eq!(edges[1].target.as_str(), "SPDXRef-zlib");
    }

    #[test]
    fn test_cyclonedx_document() {
        let graph = parse(CDX_DOC);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node(&NodeId::new("app")).unwrap().kind, NodeKind::Project);
        let left_pad = graph.node(&NodeId::new("pkg:npm/left-pad@1.3.0")).unwrap();
        assert!(left_pad.license().unwrap().to_string().contains("WTFPL"));
        let serde = graph.node(&NodeId::new("pkg:cargo/serde@1.0")).unwrap();
        assert_eq!(serde.license().unwrap().license_ids().count(), 2);
    }

    #[test]
    fn test_detect() {
        let parser = SbomParser::new();
        assert_eq!(parser.detect(SPDX_DOC), FormatConfidence::CERTAIN);
        assert_eq!(parser.detect(CDX_DOC), FormatConfidence::CERTAIN);
        assert_eq!(parser.detect(r#"{"targets": {}}"#), FormatConfidence::NONE);
    }
}
