//! Exception and LICENSE-scope resolution.
//!
//! Runs after graph assembly and before inference. The two passes are the
//! only places node licenses change once the graph is built:
//!
//! 1. [`resolve_license_scopes`] AND-merges directory LICENSE files into the
//!    nodes they cover.
//! 2. [`resolve_exceptions`] attaches exceptions to their default targets.

mod exceptions;
mod scope;

pub use exceptions::{ExceptionReport, resolve_exceptions};
pub use scope::{
    LicenseScope, ScopeReport, discover_license_scopes, is_license_file, license_directory,
    resolve_license_scopes,
};

use serde::{Deserialize, Serialize};

use crate::graph::LicenseGraph;
use crate::rules::RuleStore;

/// Combined result of both resolver passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveReport {
    pub scopes: ScopeReport,
    pub exceptions: ExceptionReport,
}

/// Run scope resolution with the discovered and `extra` scopes, then
/// exception resolution.
pub fn resolve(graph: &mut LicenseGraph, rules: &RuleStore, extra: &[LicenseScope]) -> ResolveReport {
    let mut scopes = discover_license_scopes(graph);
    for scope in extra {
        if !scopes.iter().any(|known| known.license_file == scope.license_file) {
            scopes.push(scope.clone());
        }
    }

    let scope_report = resolve_license_scopes(graph, &scopes);
    tracing::info!(
        scopes = scope_report.scopes,
        merged = scope_report.merged,
        "Resolved LICENSE scopes"
    );

    let exception_report = resolve_exceptions(graph, rules);
    tracing::info!(
        found = exception_report.found.len(),
        applied = exception_report.applied,
        conflicts = exception_report.conflicts,
        "Resolved exceptions"
    );

    ResolveReport {
        scopes: scope_report,
        exceptions: exception_report,
    }
}
