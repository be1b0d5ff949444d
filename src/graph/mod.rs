//! Typed dependency multigraph.
//!
//! Parsers assemble a [`LicenseGraph`] once; afterwards only the resolver
//! touches node licenses and the inference engine reads the graph through a
//! shared reference.

mod canonical;
mod cycle;
mod manager;
mod types;

pub use canonical::{CanonicalEdge, CanonicalGraph, CanonicalNode};
pub use manager::{LicenseGraph, path_has_prefix};
pub use types::{Edge, Node, NodeId, NodeKind, Relation};
