//! Per-edge verdict inference.

use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::knowledge::{KgKey, KnowledgeGraph};
use super::verdict::Verdict;
use crate::graph::{Edge, LicenseGraph, Node, NodeId, Relation};
use crate::license::{ExceptionConflict, LicenseExpr, LicenseTerm, Operator, UnknownLicenseWarning};
use crate::rules::{LicenseFamily, RuleStore};

/// How an edge verdict was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Served from the knowledge graph
    CacheHit,
    /// Folded over the rule tables
    Computed,
    /// One side had no license; nothing to look up
    MissingLicense,
}

/// Verdict for a single edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeVerdict {
    /// Index of the edge in graph order
    pub index: usize,
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
    pub verdict: Verdict,
    pub resolution: Resolution,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<UnknownLicenseWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ExceptionConflict>,
}

/// Verdict attached to a node.
///
/// Raised when the node's own license is missing, unresolved or conflicts
/// with itself, and when an ancestor takes on copyleft obligations it cannot
/// meet from further down the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVerdict {
    pub node: NodeId,
    pub verdict: Verdict,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<UnknownLicenseWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ExceptionConflict>,
}

/// Number of edges per verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub compatible: usize,
    pub unknown: usize,
    pub needs_review: usize,
    pub incompatible: usize,
}

impl VerdictCounts {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Compatible => self.compatible += 1,
            Verdict::Unknown => self.unknown += 1,
            Verdict::NeedsReview => self.needs_review += 1,
            Verdict::Incompatible => self.incompatible += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.compatible + self.unknown + self.needs_review + self.incompatible
    }
}

/// Everything one inference run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceOutcome {
    pub edges: Vec<EdgeVerdict>,
    pub nodes: Vec<NodeVerdict>,
    pub counts: VerdictCounts,
    pub cache_hits: usize,
    pub computed: usize,
}

impl InferenceOutcome {
    /// Worst verdict over all edges and nodes
    #[must_use]
    pub fn overall(&self) -> Verdict {
        self.edges
            .iter()
            .map(|edge| edge.verdict)
            .chain(self.nodes.iter().map(|node| node.verdict))
            .max()
            .unwrap_or_default()
    }

    /// Verdict for the edge at `index`
    #[must_use]
    pub fn edge(&self, index: usize) -> Option<&EdgeVerdict> {
        self.edges.get(index)
    }
}

/// Verdict of a license pair before node-level adjustments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairVerdict {
    pub verdict: Verdict,
    pub resolution: Resolution,
    pub warnings: Vec<UnknownLicenseWarning>,
}

/// Relations across which a dependency's copyleft obligations reach the user
const fn carries_obligations(relation: Relation) -> bool {
    matches!(relation, Relation::LinksStatic | Relation::Sources)
}

fn aggregate(op: Operator, verdicts: Vec<Verdict>) -> Verdict {
    let folded = match op {
        Operator::And => verdicts.into_iter().max(),
        Operator::Or => verdicts.into_iter().min(),
    };
    folded.unwrap_or_default()
}

/// Computes verdicts from the rule store, memoized in the knowledge graph.
///
/// Holds only shared references, so one engine serves all worker threads.
#[derive(Debug, Clone, Copy)]
pub struct InferenceEngine<'a> {
    rules: &'a RuleStore,
    knowledge: &'a KnowledgeGraph,
    permissive_unknown: bool,
}

impl<'a> InferenceEngine<'a> {
    #[must_use]
    pub const fn new(rules: &'a RuleStore, knowledge: &'a KnowledgeGraph, permissive_unknown: bool) -> Self {
        Self {
            rules,
            knowledge,
            permissive_unknown,
        }
    }

    /// Verdict for `source` using `target` across `relation`.
    ///
    /// `AND` takes the worst leaf-pair verdict and `OR` the best, over the
    /// source expression first and then the target expression. Unknown ids
    /// count as compatible in permissive mode and as needing review
    /// otherwise, with a warning for each.
    #[must_use]
    pub fn infer_pair(
        &self,
        source: Option<&LicenseExpr>,
        target: Option<&LicenseExpr>,
        relation: Relation,
    ) -> PairVerdict {
        let (Some(source), Some(target)) = (source, target) else {
            return PairVerdict {
                verdict: Verdict::Unknown,
                resolution: Resolution::MissingLicense,
                warnings: Vec::new(),
            };
        };

        let warnings = if self.permissive_unknown {
            Vec::new()
        } else {
            let mut warnings = self.unknown_warnings(source);
            for warning in self.unknown_warnings(target) {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
            warnings
        };

        let key = KgKey::new(source, target, relation);
        if let Some(verdict) = self.knowledge.get(&key) {
            return PairVerdict {
                verdict,
                resolution: Resolution::CacheHit,
                warnings,
            };
        }

        let computed = self.compute(source, target, relation);
        let verdict = self.knowledge.insert(key, computed);
        PairVerdict {
            verdict,
            resolution: Resolution::Computed,
            warnings,
        }
    }

    fn compute(&self, source: &LicenseExpr, target: &LicenseExpr, relation: Relation) -> Verdict {
        source.fold(
            |source_leaf| {
                target.fold(
                    |target_leaf| self.leaf_pair(source_leaf, target_leaf, relation),
                    aggregate,
                )
            },
            aggregate,
        )
    }

    fn leaf_pair(&self, source: &LicenseExpr, target: &LicenseExpr, relation: Relation) -> Verdict {
        match (source, target) {
            (LicenseExpr::License(a), LicenseExpr::License(b))
                if self.rules.is_known(a) && self.rules.is_known(b) =>
            {
                self.rules.action(relation, a, b)
            }
            _ => self.unknown_verdict(),
        }
    }

    const fn unknown_verdict(&self) -> Verdict {
        if self.permissive_unknown {
            Verdict::Compatible
        } else {
            Verdict::NeedsReview
        }
    }

    fn unknown_warnings(&self, expr: &LicenseExpr) -> Vec<UnknownLicenseWarning> {
        let mut warnings = Vec::new();
        for leaf in expr.leaves() {
            let warning = match leaf {
                LicenseExpr::Unknown(raw) => Some(UnknownLicenseWarning::license(raw.as_str())),
                LicenseExpr::License(term) if !self.rules.contains_license(&term.id) => {
                    Some(UnknownLicenseWarning::license(term.id.as_str()))
                }
                LicenseExpr::License(term) => term
                    .exception
                    .as_deref()
                    .filter(|exception| !self.rules.contains_exception(exception))
                    .map(UnknownLicenseWarning::exception),
                LicenseExpr::And(_) | LicenseExpr::Or(_) => None,
            };
            if let Some(warning) = warning {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }
        warnings
    }

    fn evaluate_edge(&self, graph: &LicenseGraph, index: usize, edge: &Edge) -> EdgeVerdict {
        let source = graph.node(&edge.source);
        let target = graph.node(&edge.target);
        let pair = self.infer_pair(
            source.and_then(Node::license),
            target.and_then(Node::license),
            edge.relation,
        );

        let conflicts: Vec<ExceptionConflict> = source
            .into_iter()
            .chain(target)
            .flat_map(|node| node.exception_conflicts().iter().cloned())
            .collect();
        let verdict = if conflicts.is_empty() {
            pair.verdict
        } else {
            pair.verdict.worst(Verdict::NeedsReview)
        };

        EdgeVerdict {
            index,
            source: edge.source.clone(),
            target: edge.target.clone(),
            relation: edge.relation,
            verdict,
            resolution: pair.resolution,
            warnings: pair.warnings,
            conflicts,
        }
    }

    /// Verdict of an expression against itself.
    ///
    /// Terms joined by `AND` apply to the same component together, so every
    /// pair of them is checked in both directions over [`Relation::Sources`]
    /// and the better direction counts. `OR` takes the best alternative.
    /// Terms the rule store does not know are left to the unknown-id checks.
    #[must_use]
    pub fn self_verdict(&self, license: &LicenseExpr) -> Verdict {
        let (verdict, _) = license.fold(
            |leaf| match leaf {
                LicenseExpr::License(term) if self.rules.is_known(term) => {
                    (Verdict::Compatible, Some(term.clone()))
                }
                _ => (Verdict::Compatible, None),
            },
            |op, children: Vec<(Verdict, Option<LicenseTerm>)>| match op {
                Operator::Or => {
                    let best = children.into_iter().map(|(verdict, _)| verdict).min();
                    (best.unwrap_or_default(), None)
                }
                Operator::And => {
                    let mut worst = Verdict::Compatible;
                    let mut terms = Vec::new();
                    for (verdict, term) in children {
                        worst = worst.worst(verdict);
                        terms.extend(term);
                    }
                    for (i, a) in terms.iter().enumerate() {
                        for b in terms.iter().skip(i + 1).filter(|b| b.id != a.id) {
                            let forward = self.rules.action(Relation::Sources, a, b);
                            let backward = self.rules.action(Relation::Sources, b, a);
                            worst = worst.worst(forward.best(backward));
                        }
                    }
                    (worst, None)
                }
            },
        );
        verdict
    }

    fn evaluate_node(&self, node: &Node) -> Option<NodeVerdict> {
        let mut warnings = node.warnings().to_vec();
        if let Some(license) = node.license() {
            for warning in self.unknown_warnings(license) {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }
        let conflicts = node.exception_conflicts().to_vec();
        let own = node
            .license()
            .map_or(Verdict::Compatible, |license| self.self_verdict(license));

        let (verdict, reason) = if node.license().is_none() {
            (Verdict::Unknown, "no license information".to_string())
        } else if !own.is_compatible() {
            (own, "license terms conflict with each other".to_string())
        } else if !conflicts.is_empty() {
            (Verdict::NeedsReview, "conflicting exceptions".to_string())
        } else if !warnings.is_empty() && !self.permissive_unknown {
            (Verdict::NeedsReview, "unknown license ids".to_string())
        } else {
            return None;
        };

        Some(NodeVerdict {
            node: node.id.clone(),
            verdict,
            reason,
            warnings,
            conflicts,
        })
    }

    fn carries_copyleft(&self, expr: &LicenseExpr, relation: Relation) -> bool {
        expr.terms().any(|term| {
            self.rules
                .effective_family(term, relation)
                .is_some_and(LicenseFamily::is_copyleft)
        })
    }

    /// Check copyleft obligations inherited from below the direct children.
    ///
    /// Nodes are visited children first. Across every incoming `links-static`
    /// or `sources` edge a node hands its own expression, and whatever it
    /// inherited itself, to the parent as long as the expression keeps a
    /// copyleft term over that relation. The parent's license is then checked
    /// against each inherited expression. A child's own license is covered by
    /// the edge verdict, so only obligations from further down are checked
    /// here. Nodes on a cycle are never ready and are skipped.
    #[must_use]
    pub fn propagate(&self, graph: &LicenseGraph) -> Vec<NodeVerdict> {
        let mut pending: HashMap<&NodeId, usize> = graph.node_ids().map(|id| (id, 0)).collect();
        for edge in graph.edges() {
            if carries_obligations(edge.relation) {
                if let Some(count) = pending.get_mut(&edge.source) {
                    *count += 1;
                }
            }
        }

        let mut ready: Vec<&NodeId> = graph
            .node_ids()
            .filter(|id| pending.get(*id) == Some(&0))
            .collect();
        ready.reverse();
        let mut inherited: HashMap<&NodeId, BTreeSet<LicenseExpr>> = HashMap::new();
        let mut verdicts = Vec::new();

        while let Some(id) = ready.pop() {
            let carried = inherited.remove(id).unwrap_or_default();
            let own = graph.node(id).and_then(Node::license);

            for edge in graph.incoming(id) {
                if !carries_obligations(edge.relation) {
                    continue;
                }
                let parent_license = graph.node(&edge.source).and_then(Node::license);
                for obligation in &carried {
                    if !self.carries_copyleft(obligation, edge.relation) {
                        continue;
                    }
                    let Some(license) = parent_license else {
                        break;
                    };
                    let pair = self.infer_pair(Some(license), Some(obligation), edge.relation);
                    if pair.verdict.is_compatible() {
                        continue;
                    }
                    tracing::debug!(
                        node = %edge.source,
                        via = %id,
                        obligation = %obligation,
                        verdict = %pair.verdict,
                        "Inherited obligation not met"
                    );
                    verdicts.push(NodeVerdict {
                        node: edge.source.clone(),
                        verdict: pair.verdict,
                        reason: format!("inherits {obligation} through {id}"),
                        warnings: pair.warnings,
                        conflicts: Vec::new(),
                    });
                }

                let passed = inherited.entry(&edge.source).or_default();
                for obligation in own.into_iter().chain(&carried) {
                    if self.carries_copyleft(obligation, edge.relation) {
                        passed.insert(obligation.clone());
                    }
                }

                if let Some(count) = pending.get_mut(&edge.source) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(&edge.source);
                    }
                }
            }
        }

        verdicts
    }

    /// Infer every edge in parallel and collect node verdicts.
    ///
    /// Edge verdicts are returned in graph edge order.
    #[must_use]
    pub fn infer_all(&self, graph: &LicenseGraph) -> InferenceOutcome {
        let edges: Vec<EdgeVerdict> = graph
            .edges()
            .par_iter()
            .enumerate()
            .map(|(index, edge)| self.evaluate_edge(graph, index, edge))
            .collect();

        let mut nodes: Vec<NodeVerdict> = graph
            .nodes()
            .filter_map(|node| self.evaluate_node(node))
            .collect();
        nodes.extend(self.propagate(graph));

        let mut counts = VerdictCounts::default();
        let mut cache_hits = 0;
        let mut computed = 0;
        for edge in &edges {
            counts.record(edge.verdict);
            match edge.resolution {
                Resolution::CacheHit => cache_hits += 1,
                Resolution::Computed => computed += 1,
                Resolution::MissingLicense => {}
            }
        }

        tracing::info!(
            edges = edges.len(),
            compatible = counts.compatible,
            needs_review = counts.needs_review,
            incompatible = counts.incompatible,
            unknown = counts.unknown,
            node_verdicts = nodes.len(),
            cache_hits,
            "Inference complete"
        );

        InferenceOutcome {
            edges,
            nodes,
            counts,
            cache_hits,
            computed,
        }
    }
}
