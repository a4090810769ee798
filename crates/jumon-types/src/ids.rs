//! Arena identifiers for selection-tree nodes.
//!
//! Node ids are handed out sequentially by the tree that owns the node. They
//! are never reused within one tree, so a stale id simply fails to resolve.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum expected selection-tree depth. Ancestor walks use this as a circuit breaker.
///
/// Hand-built prompts rarely nest deeper than three or four groups; exceeding
/// this indicates a cycle in the parent links.
pub const MAX_TREE_DEPTH: usize = 256;

/// Address of a node in a selection-tree arena.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The id every tree assigns to its root group.
    pub const ROOT: Self = Self(0);

    /// Wrap a raw arena index.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw arena index.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id allocated after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    /// Accepts both `12` and the display form `#12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

// ============================================================================
// Tests
// ============================================================================
