//! ScanCode result parser.
//!
//! Annotates file nodes already in the graph with the licenses ScanCode
//! detected for them and turns detected LICENSE files into
//! [`LicenseScope`]s. All detections for one file are AND-merged.

use indexmap::IndexMap;
use serde::Deserialize;

use super::traits::{FormatConfidence, GraphParser, ParseContext};
use crate::error::Result;
use crate::graph::NodeId;
use crate::license::{parse_expression, LicenseExpr, UnknownLicenseWarning};
use crate::resolver::{is_license_file, LicenseScope};
use crate::rules::RuleStore;

const SCANCODE_REF_PREFIX: &str = "LicenseRef-scancode-";
const LANGUAGE_SUFFIXES: &[&str] = &["-en", "-cn"];

#[derive(Debug, Deserialize)]
struct ScanResult {
    #[serde(default)]
    files: Vec<ScannedFile>,
    #[serde(default)]
    license_detections: Vec<LicenseDetection>,
}

#[derive(Debug, Deserialize)]
struct ScannedFile {
    path: String,
    #[serde(rename = "type", default)]
    file_type: String,
    detected_license_expression_spdx: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LicenseDetection {
    #[serde(default)]
    reference_matches: Vec<ReferenceMatch>,
}

#[derive(Debug, Deserialize)]
struct ReferenceMatch {
    from_file: String,
    license_expression_spdx: Option<String>,
}

#[derive(Debug, Default)]
struct FileLicense {
    expr: Option<LicenseExpr>,
    warnings: Vec<UnknownLicenseWarning>,
}

/// Parser for ScanCode JSON output (`scancode --json-pp`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScancodeParser;

impl ScancodeParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn collect(
        &self,
        ctx: &ParseContext<'_>,
        detected: &mut IndexMap<String, FileLicense>,
        raw_path: &str,
        text: &str,
    ) -> Result<()> {
        let path = scan_relative_path(raw_path);
        let text = if ctx.options().strip_scancode_refs {
            strip_scancode_refs(text, ctx.rules())
        } else {
            text.to_string()
        };
        let parsed = ctx.parse_license(&text, &format!("file {path}"))?;
        let Some(expr) = parsed.expr else {
            return Ok(());
        };

        let entry = detected.entry(path).or_default();
        entry.expr = Some(LicenseExpr::merge_and_opt(entry.expr.as_ref(), &expr));
        for warning in parsed.warnings {
            if !entry.warnings.contains(&warning) {
                entry.warnings.push(warning);
            }
        }
        Ok(())
    }
}

impl GraphParser for ScancodeParser {
    fn name(&self) -> &'static str {
        "scancode"
    }

    fn detect(&self, content: &str) -> FormatConfidence {
        if !content.contains("\"files\"") {
            return FormatConfidence::NONE;
        }
        if content.contains("\"detected_license_expression_spdx\"") {
            FormatConfidence::CERTAIN
        } else if content.contains("\"headers\"") && content.contains("scancode") {
            FormatConfidence::MEDIUM
        } else {
            FormatConfidence::NONE
        }
    }

    fn parse_str(&self, content: &str, ctx: &mut ParseContext<'_>) -> Result<()> {
        let scan: ScanResult = serde_json::from_str(content)?;

        let mut detected: IndexMap<String, FileLicense> = IndexMap::new();
        for file in &scan.files {
            if file.file_type == "directory" {
                continue;
            }
            if let Some(text) = &file.detected_license_expression_spdx {
                self.collect(ctx, &mut detected, &file.path, text)?;
            }
        }
        for detection in &scan.license_detections {
            for matched in &detection.reference_matches {
                if let Some(text) = &matched.license_expression_spdx {
                    self.collect(ctx, &mut detected, &matched.from_file, text)?;
                }
            }
        }

        let mut annotated = 0usize;
        let mut unmatched = 0usize;
        for (path, license) in detected {
            let Some(expr) = license.expr else {
                continue;
            };
            let file_name = path.rsplit('/').next().unwrap_or(&path);
            if is_license_file(file_name) {
                ctx.add_scope(LicenseScope::for_file(path.as_str(), expr.clone()));
            }

            let id = NodeId::new(format!("//{path}"));
            match ctx.graph_mut().node_mut(&id) {
                Some(node) => {
                    node.merge_license(&expr);
                    node.add_warnings(license.warnings);
                    annotated += 1;
                }
                None => unmatched += 1,
            }
        }

        tracing::debug!(
            annotated,
            unmatched,
            scopes = ctx.scopes().len(),
            "Parsed ScanCode results"
        );
        Ok(())
    }
}

/// Drop the scan root, the first path component ScanCode reports.
fn scan_relative_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.trim_start_matches("./").trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Map ScanCode-specific ids to plain ids the rule store knows.
///
/// `LicenseRef-scancode-foo-en` is tried as `foo-en` and then `foo`; an id is
/// only rewritten when the rewritten form is known.
fn strip_scancode_id(id: &str, rules: &RuleStore) -> String {
    if rules.contains_license(id) {
        return id.to_string();
    }
    let Some(stripped) = id.strip_prefix(SCANCODE_REF_PREFIX) else {
        return id.to_string();
    };
    if rules.contains_license(stripped) {
        return stripped.to_string();
    }
    LANGUAGE_SUFFIXES
        .iter()
        .filter_map(|suffix| stripped.strip_suffix(suffix))
        .find(|candidate| rules.contains_license(candidate))
        .map_or_else(|| id.to_string(), str::to_string)
}

fn strip_scancode_refs(text: &str, rules: &RuleStore) -> String {
    match parse_expression(text) {
        Ok(expr) => expr
            .map_leaves(|leaf| match leaf {
                LicenseExpr::License(term) => {
                    let mut term = term.clone();
                    term.id = strip_scancode_id(&term.id, rules);
                    LicenseExpr::License(term)
                }
                other => other.clone(),
            })
            .to_string(),
        Err(_) => text.to_string(),
    }
}
