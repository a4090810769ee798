//! Selection-tree node types.

use std::sync::Arc;

use jumon_types::{NodeId, Term};

/// One arena slot: a leaf or a group, plus its navigational parent link.
///
/// The parent owns the child through its `children` list; `parent` is only a
/// back-reference for ancestor walks.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

/// Closed set of node variants.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A picked term. Shared with the taxonomy, never mutated.
    Leaf(Arc<Term>),
    /// An ordered, optionally weighted composite.
    Group(Group),
}

/// Children (kept in rank order) and an optional weight.
#[derive(Clone, Debug, Default)]
pub struct Group {
    pub children: Vec<NodeId>,
    pub weight: Option<f64>,
}

impl Node {
    pub(crate) fn leaf(id: NodeId, term: Arc<Term>) -> Self {
        Self { id, parent: None, kind: NodeKind::Leaf(term) }
    }

    pub(crate) fn group(id: NodeId) -> Self {
        Self { id, parent: None, kind: NodeKind::Group(Group::default()) }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// The wrapped term, for leaves.
    pub fn term(&self) -> Option<&Arc<Term>> {
        match &self.kind {
            NodeKind::Leaf(term) => Some(term),
            NodeKind::Group(_) => None,
        }
    }

    /// Group payload, for groups.
    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Leaf(_) => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Child ids; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Group(group) => &group.children,
            NodeKind::Leaf(_) => &[],
        }
    }
}
