//! Compatibility inference.
//!
//! [`InferenceEngine`] classifies every edge of a resolved graph by folding
//! the source and target license expressions over the rule store's action
//! tables. Results are memoized per normalized license pair in the
//! [`KnowledgeGraph`], which can be persisted between runs. [`RunContext`]
//! bundles the per-run state.

mod context;
mod engine;
mod knowledge;
mod verdict;

pub use context::RunContext;
pub use engine::{
    EdgeVerdict, InferenceEngine, InferenceOutcome, NodeVerdict, PairVerdict, Resolution,
    VerdictCounts,
};
pub use knowledge::{KgKey, KnowledgeGraph, KNOWLEDGE_GRAPH_VERSION};
pub use verdict::Verdict;
