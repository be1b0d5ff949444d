//! Exception propagation.
//!
//! An exception found anywhere in the graph is attached to every unqualified
//! occurrence of its `default_target` licenses. The pass works on a snapshot
//! of the exceptions present when it starts, so exceptions introduced by the
//! pass itself do not cascade.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::graph::{LicenseGraph, NodeId};
use crate::rules::RuleStore;

/// Summary of an exception resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionReport {
    /// Exception ids present in the graph when the pass started
    pub found: Vec<String>,
    /// Node licenses changed by the pass
    pub applied: usize,
    /// Leaves that already carried a different exception
    pub conflicts: usize,
    /// Exception ids the rule store does not define
    pub unknown: Vec<String>,
}

/// Apply every exception present in the graph to its default targets.
pub fn resolve_exceptions(graph: &mut LicenseGraph, rules: &RuleStore) -> ExceptionReport {
    let found: BTreeSet<String> = graph
        .nodes()
        .filter_map(|node| node.license())
        .flat_map(|expr| expr.exception_ids().map(str::to_string).collect::<Vec<_>>())
        .collect();
    let ids: Vec<NodeId> = graph.node_ids().cloned().collect();

    let mut report = ExceptionReport {
        found: found.iter().cloned().collect(),
        ..ExceptionReport::default()
    };

    for exception_id in &found {
        let Some(clause) = rules.exception(exception_id) else {
            tracing::warn!("Skipping unknown exception '{}'", exception_id);
            report.unknown.push(exception_id.clone());
            continue;
        };
        if clause.default_target.is_empty() {
            continue;
        }

        for id in &ids {
            let Some(node) = graph.node_mut(id) else {
                continue;
            };
            if node.applied_exceptions().contains(exception_id) {
                continue;
            }
            let Some(license) = node.license() else {
                continue;
            };
            if !clause
                .default_target
                .iter()
                .any(|target| license.has_license(target))
            {
                continue;
            }

            let application = license.apply_exception_to_targets(exception_id, &clause.default_target);
            let changed = application.expr != *license;
            node.mark_exception(exception_id);

            if !application.conflicts.is_empty() {
                for conflict in &application.conflicts {
                    tracing::warn!("{}: {}", id, conflict);
                }
                report.conflicts += application.conflicts.len();
                node.add_conflicts(application.conflicts);
            }
            if changed {
                tracing::debug!("{}: applied {} -> {}", id, exception_id, application.expr);
                node.replace_license(application.expr);
                report.applied += 1;
            }
        }
    }

    report
}
