//! Error types for selection-tree operations.

use jumon_types::NodeId;
use thiserror::Error;

/// Errors that can occur when addressing tree nodes.
///
/// Operations on absent *terms* are no-ops and never produce these; errors
/// are reserved for node ids that do not resolve or that name the wrong kind
/// of node.
#[derive(Error, Debug, PartialEq)]
pub enum TreeError {
    /// Node id not present in the arena.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Operation needs a group but the id names a leaf.
    #[error("node {0} is a leaf, not a group")]
    NotAGroup(NodeId),

    /// Weight must be a finite number.
    #[error("invalid weight {0}: must be finite")]
    InvalidWeight(f64),

    /// Inserting `node` under `into` would make a node its own ancestor.
    #[error("inserting {node} into {into} would create a cycle")]
    WouldCycle { node: NodeId, into: NodeId },

    /// Group has no leaf below it and cannot join the tree.
    #[error("group {0} holds no terms")]
    EmptyGroup(NodeId),

    /// Structural invariant violated (reported by `check_invariants`).
    #[error("tree invariant violated: {0}")]
    Invariant(String),
}
