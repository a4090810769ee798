//! The selection tree: an arena of groups and leaves with rank ordering.
//!
//! # Structure
//!
//! ```text
//! root (Group, never pruned)
//! ├── Group #3              ← singleton wrapper created by `select`
//! │   └── Leaf #2 → "masterpiece"
//! └── Group #7 :1.2         ← composite created by `group`
//!     ├── Group #5
//!     │   └── Leaf #4 → "indoors"
//!     └── Group #6
//!         └── Leaf #8 → "kitchen"
//! ```
//!
//! # Invariants
//!
//! Every public mutation leaves the tree in this state before returning:
//!
//! - children of every reachable group are sorted by effective rank (a group's
//!   rank is its first child's rank);
//! - no reachable group other than the root is empty;
//! - a weightless non-root group never wraps exactly one group after a
//!   removal (it is collapsed into its child);
//! - every node has at most one parent and appears in exactly that parent's
//!   child list.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use jumon_types::{MAX_TREE_DEPTH, NodeId, Rank, Term};

use crate::node::{Group, Node, NodeKind};
use crate::{Result, TreeError};

/// A user's current composition of picked terms.
///
/// Nodes live in an arena keyed by sequential [`NodeId`]s; parents own their
/// children through `Group::children` and children point back through
/// `Node::parent`.
#[derive(Clone, Debug)]
pub struct SelectionTree {
    nodes: HashMap<NodeId, Node>,
    next_id: NodeId,
}

impl Default for SelectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTree {
    /// Create a tree holding only an empty root group.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::ROOT, Node::group(NodeId::ROOT));
        Self { nodes, next_id: NodeId::ROOT.next() }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Child ids of a group; empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(Node::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Weight of a group, if it has one.
    pub fn weight(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(&id).and_then(Node::as_group).and_then(|group| group.weight)
    }

    pub fn is_group(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(Node::is_group)
    }

    /// Number of arena slots in use, detached nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.children(NodeId::ROOT).is_empty()
    }

    /// Whether a leaf for this term is reachable from the root.
    pub fn contains(&self, term: &Term) -> bool {
        self.find_leaf(NodeId::ROOT, term).is_some()
    }

    /// Selected terms in tree order (which is rank order within each group).
    pub fn terms(&self) -> Vec<Arc<Term>> {
        let mut out = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else { continue };
            match &node.kind {
                NodeKind::Leaf(term) => out.push(Arc::clone(term)),
                NodeKind::Group(group) => stack.extend(group.children.iter().rev()),
            }
        }
        out
    }

    /// Effective rank: a leaf's term rank, or a group's first child's rank.
    ///
    /// `None` for empty groups and unknown ids.
    pub fn rank(&self, id: NodeId) -> Option<&Rank> {
        let mut current = id;
        for _ in 0..MAX_TREE_DEPTH {
            match &self.nodes.get(&current)?.kind {
                NodeKind::Leaf(term) => return Some(&term.rank),
                NodeKind::Group(group) => current = *group.children.first()?,
            }
        }
        tracing::warn!("rank() hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}) from {id}");
        None
    }

    /// `id` followed by each of its ancestors, nearest first.
    ///
    /// Circuit-breaks on cycles and at `MAX_TREE_DEPTH`.
    pub fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.nodes.contains_key(&id).then_some(id);
        while let Some(node) = current {
            if !seen.insert(node) {
                tracing::warn!("lineage() found a parent cycle at {node}");
                break;
            }
            if chain.len() >= MAX_TREE_DEPTH {
                tracing::warn!("lineage() hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}), truncating");
                break;
            }
            chain.push(node);
            current = self.parent(node);
        }
        chain
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn alloc(&mut self, make: impl FnOnce(NodeId) -> Node) -> NodeId {
        let id = self.next_id;
        self.next_id = id.next();
        self.nodes.insert(id, make(id));
        id
    }

    /// Allocate a detached leaf for `term`. Attach it with [`Self::insert`].
    pub fn new_leaf(&mut self, term: Arc<Term>) -> NodeId {
        self.alloc(|id| Node::leaf(id, term))
    }

    /// Allocate a detached, empty group. Attach it with [`Self::insert`].
    pub fn new_group(&mut self) -> NodeId {
        self.alloc(Node::group)
    }

    /// Allocate a detached group wrapping a fresh leaf for `term`.
    fn new_singleton(&mut self, term: Arc<Term>) -> NodeId {
        let leaf = self.new_leaf(term);
        let group = self.new_group();
        self.attach(group, leaf);
        group
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend_from_slice(node.children());
            }
        }
    }

    fn group_mut(&mut self, id: NodeId) -> Result<&mut Group> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))?;
        node.as_group_mut().ok_or(TreeError::NotAGroup(id))
    }

    fn require_group(&self, id: NodeId) -> Result<&Group> {
        let node = self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))?;
        node.as_group().ok_or(TreeError::NotAGroup(id))
    }

    /// Link `child` under `group` without sorting. Both must exist.
    fn attach(&mut self, group: NodeId, child: NodeId) {
        if let Some(children) = self.nodes.get_mut(&group).and_then(Node::as_group_mut) {
            children.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(group);
        }
    }

    /// Unlink `child` from `group`. Returns false if it was not a child.
    fn detach(&mut self, group: NodeId, child: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(&group).and_then(Node::as_group_mut) else {
            return false;
        };
        let Some(pos) = parent.children.iter().position(|&c| c == child) else {
            return false;
        };
        parent.children.remove(pos);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        true
    }

    /// Put `new` in `old`'s slot under `group`.
    fn replace_child(&mut self, group: NodeId, old: NodeId, new: NodeId) {
        if let Some(parent) = self.nodes.get_mut(&group).and_then(Node::as_group_mut) {
            if let Some(slot) = parent.children.iter_mut().find(|c| **c == old) {
                *slot = new;
            }
        }
        if let Some(node) = self.nodes.get_mut(&new) {
            node.parent = Some(group);
        }
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    /// Rank comparator over nodes. Empty groups rank as the empty path.
    pub fn cmp_nodes(&self, a: NodeId, b: NodeId) -> Ordering {
        match (self.rank(a), self.rank(b)) {
            (Some(ra), Some(rb)) => ra.cmp(rb),
            (None, Some(rb)) if rb.is_empty() => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(ra), None) if ra.is_empty() => Ordering::Equal,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn sort_children(&mut self, id: NodeId) {
        let Some(group) = self.nodes.get_mut(&id).and_then(Node::as_group_mut) else {
            return;
        };
        let mut children = std::mem::take(&mut group.children);
        children.sort_by(|&a, &b| self.cmp_nodes(a, b));
        if let Some(group) = self.nodes.get_mut(&id).and_then(Node::as_group_mut) {
            group.children = children;
        }
    }

    /// Re-sort `id` and every ancestor: a changed first child changes the
    /// group's own rank, which can reorder it among its siblings.
    fn resort_upward(&mut self, id: NodeId) {
        for node in self.lineage(id) {
            self.sort_children(node);
        }
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Append `items` as children of `node`, then restore rank order.
    ///
    /// An item that already has a parent is detached from it first (its old
    /// parent is pruned if that empties it); a node never has two parents.
    /// Items must carry at least one leaf: an empty group is rejected rather
    /// than attached.
    pub fn insert(&mut self, node: NodeId, items: &[NodeId]) -> Result<()> {
        self.require_group(node)?;
        let lineage = self.lineage(node);
        for &item in items {
            if !self.nodes.contains_key(&item) {
                return Err(TreeError::NodeNotFound(item));
            }
            if item.is_root() || lineage.contains(&item) {
                return Err(TreeError::WouldCycle { node: item, into: node });
            }
            if !self.holds_leaf(item) {
                return Err(TreeError::EmptyGroup(item));
            }
        }

        for &item in items {
            match self.parent(item) {
                Some(previous) if previous == node => continue,
                Some(previous) => {
                    self.detach(previous, item);
                    self.settle(previous, Some(node));
                }
                None => {}
            }
            self.attach(node, item);
        }
        self.resort_upward(node);
        tracing::debug!(group = %node, count = items.len(), "inserted into group");
        Ok(())
    }

    /// Remove `child` (and its subtree) from `node`, pruning emptied groups.
    ///
    /// Returns false and changes nothing when `child` is not a child of
    /// `node`.
    pub fn remove(&mut self, node: NodeId, child: NodeId) -> bool {
        if !self.detach(node, child) {
            return false;
        }
        self.free_subtree(child);
        tracing::debug!(group = %node, child = %child, "removed from group");
        self.settle(node, None);
        true
    }

    /// Restore invariants after `group` lost a child or a weight.
    ///
    /// Walks upward pruning empty groups; a weightless group left wrapping a
    /// single group is replaced by that group. `keep` is never pruned or
    /// collapsed (it is about to receive a child).
    fn settle(&mut self, group: NodeId, keep: Option<NodeId>) {
        let mut current = group;
        for _ in 0..MAX_TREE_DEPTH {
            let Some(node) = self.nodes.get(&current) else { return };
            let (Some(payload), Some(parent)) = (node.as_group(), node.parent) else {
                // Root, a leaf, or a detached group: nothing to prune.
                self.resort_upward(current);
                return;
            };
            if Some(current) == keep {
                self.resort_upward(current);
                return;
            }

            if payload.children.is_empty() {
                self.detach(parent, current);
                self.free_subtree(current);
                tracing::debug!(group = %current, "pruned empty group");
                current = parent;
                continue;
            }

            if payload.weight.is_none() && payload.children.len() == 1 && self.is_group(payload.children[0]) {
                let only = payload.children[0];
                self.replace_child(parent, current, only);
                self.nodes.remove(&current);
                tracing::debug!(group = %current, into = %only, "collapsed single-group wrapper");
                self.resort_upward(parent);
                return;
            }

            self.resort_upward(current);
            return;
        }
        tracing::warn!("settle() hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}) from {group}");
    }

    /// The leaf wrapping `term` under `root`, depth-first.
    pub fn find_leaf(&self, root: NodeId, term: &Term) -> Option<NodeId> {
        let mut stack = vec![root];
        let mut visited = 0usize;
        while let Some(id) = stack.pop() {
            visited += 1;
            if visited > self.nodes.len() {
                tracing::warn!("find_leaf() visited more nodes than exist, stopping");
                return None;
            }
            let node = self.nodes.get(&id)?;
            match &node.kind {
                NodeKind::Leaf(leaf) if leaf.rank == term.rank => return Some(id),
                NodeKind::Leaf(_) => {}
                NodeKind::Group(group) => stack.extend(group.children.iter().rev()),
            }
        }
        None
    }

    /// Whether `id` is a leaf or has a leaf somewhere below it.
    fn holds_leaf(&self, id: NodeId) -> bool {
        let mut stack = vec![id];
        let mut visited = 0usize;
        while let Some(id) = stack.pop() {
            visited += 1;
            if visited > self.nodes.len() {
                return false;
            }
            match self.nodes.get(&id).map(|node| &node.kind) {
                Some(NodeKind::Leaf(_)) => return true,
                Some(NodeKind::Group(group)) => stack.extend_from_slice(&group.children),
                None => {}
            }
        }
        false
    }

    /// The group directly containing the leaf for `term`, searching under `root`.
    pub fn find_group(&self, root: NodeId, term: &Term) -> Option<NodeId> {
        self.find_leaf(root, term).and_then(|leaf| self.parent(leaf))
    }

    /// Deepest group under (or equal to) `root` that contains every term.
    ///
    /// Ancestor chains are compared from the `root` end. Returns `root` when
    /// the terms share nothing below it, and `None` when any term is not in
    /// the tree (or no terms are given).
    pub fn lowest_common_ancestor(&self, root: NodeId, terms: &[Arc<Term>]) -> Option<NodeId> {
        if terms.is_empty() {
            return None;
        }

        let mut chains = Vec::with_capacity(terms.len());
        for term in terms {
            let owner = self.find_group(root, term)?;
            let mut chain = self.lineage(owner);
            if let Some(pos) = chain.iter().position(|&id| id == root) {
                chain.truncate(pos + 1);
            }
            chain.reverse();
            chains.push(chain);
        }

        let shortest = chains.iter().map(Vec::len).min().unwrap_or(0);
        let mut common = root;
        for depth in 0..shortest {
            let candidate = chains[0][depth];
            if chains.iter().all(|chain| chain[depth] == candidate) {
                common = candidate;
            } else {
                break;
            }
        }
        Some(common)
    }

    /// Merge the given terms into one new composite group.
    ///
    /// Each term gets a fresh singleton wrapper inside the composite; the
    /// composite is attached at the terms' common ancestor, and only then are
    /// the old leaves removed (pruning their emptied groups). Other members
    /// of a term's previous group stay where they are.
    ///
    /// Terms not in the tree are ignored. Returns the composite, or `None`
    /// when fewer than two distinct terms are present.
    pub fn group(&mut self, root: NodeId, terms: &[Arc<Term>]) -> Result<Option<NodeId>> {
        self.require_group(root)?;

        let mut seen = HashSet::new();
        let mut present: Vec<(Arc<Term>, NodeId)> = Vec::new();
        for term in terms {
            if !seen.insert(term.rank.clone()) {
                continue;
            }
            if let Some(leaf) = self.find_leaf(root, term) {
                present.push((Arc::clone(term), leaf));
            }
        }
        if present.len() < 2 {
            tracing::debug!(present = present.len(), "group() needs at least two selected terms");
            return Ok(None);
        }

        let picked: Vec<Arc<Term>> = present.iter().map(|(term, _)| Arc::clone(term)).collect();
        let ancestor = self.lowest_common_ancestor(root, &picked).unwrap_or(root);

        let composite = self.new_group();
        for term in &picked {
            let wrapper = self.new_singleton(Arc::clone(term));
            self.attach(composite, wrapper);
        }
        self.sort_children(composite);
        self.insert(ancestor, &[composite])?;

        for (_, old_leaf) in present {
            if let Some(owner) = self.parent(old_leaf) {
                self.remove(owner, old_leaf);
            }
        }

        tracing::debug!(group = %composite, at = %ancestor, terms = picked.len(), "grouped terms");
        Ok(Some(composite))
    }

    /// Move each term out of its group into a fresh singleton directly under `root`.
    ///
    /// Terms already owned by `root` itself, or not in the tree, are skipped.
    /// Returns the new singleton groups.
    pub fn ungroup(&mut self, root: NodeId, terms: &[Arc<Term>]) -> Result<Vec<NodeId>> {
        self.require_group(root)?;

        let mut seen = HashSet::new();
        let mut singles = Vec::new();
        for term in terms {
            if !seen.insert(term.rank.clone()) {
                continue;
            }
            let Some(old_leaf) = self.find_leaf(root, term) else { continue };
            let Some(owner) = self.parent(old_leaf) else { continue };
            if owner == root {
                continue;
            }

            let single = self.new_singleton(Arc::clone(term));
            self.insert(root, &[single])?;
            self.remove(owner, old_leaf);
            singles.push(single);
        }

        tracing::debug!(count = singles.len(), "ungrouped terms");
        Ok(singles)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Pick a term: wrap it in a singleton group under the root.
    ///
    /// Returns the new group, or `None` if the term is already selected.
    pub fn select(&mut self, term: Arc<Term>) -> Option<NodeId> {
        if self.contains(&term) {
            tracing::debug!(term = %term.output_text, "already selected, skipping");
            return None;
        }
        let single = self.new_singleton(term);
        self.attach(NodeId::ROOT, single);
        self.resort_upward(NodeId::ROOT);
        Some(single)
    }

    /// Unpick a term wherever it sits. Returns false if it was not selected.
    pub fn deselect(&mut self, term: &Term) -> bool {
        let Some(leaf) = self.find_leaf(NodeId::ROOT, term) else {
            return false;
        };
        match self.parent(leaf) {
            Some(owner) => self.remove(owner, leaf),
            None => false,
        }
    }

    /// Set or clear a group's weight.
    ///
    /// Clearing the weight of a group that wraps a single group collapses it,
    /// so `group` may no longer exist afterwards.
    pub fn set_weight(&mut self, group: NodeId, weight: Option<f64>) -> Result<()> {
        if let Some(w) = weight {
            if !w.is_finite() {
                return Err(TreeError::InvalidWeight(w));
            }
        }
        self.group_mut(group)?.weight = weight;
        tracing::debug!(group = %group, weight = ?weight, "set group weight");
        self.settle(group, None);
        Ok(())
    }

    /// Drop every selection.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Verify sortedness, pruning, parent links, and acyclicity of everything
    /// reachable from the root.
    pub fn check_invariants(&self) -> Result<()> {
        let root = self.nodes.get(&NodeId::ROOT).ok_or(TreeError::NodeNotFound(NodeId::ROOT))?;
        if root.parent.is_some() || !root.is_group() {
            return Err(TreeError::Invariant("root must be a parentless group".into()));
        }

        let mut seen = HashSet::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(TreeError::Invariant(format!("{id} is reachable twice")));
            }
            let node = self
                .nodes
                .get(&id)
                .ok_or_else(|| TreeError::Invariant(format!("dangling child {id}")))?;
            let Some(group) = node.as_group() else { continue };

            if !id.is_root() && group.children.is_empty() {
                return Err(TreeError::Invariant(format!("empty group {id}")));
            }
            for &child in &group.children {
                let parent = self.parent(child);
                if parent != Some(id) {
                    return Err(TreeError::Invariant(format!(
                        "{child} listed under {id} but points at {parent:?}"
                    )));
                }
            }
            for pair in group.children.windows(2) {
                if self.cmp_nodes(pair[0], pair[1]) == Ordering::Greater {
                    return Err(TreeError::Invariant(format!(
                        "children of {id} out of order: {} before {}",
                        pair[0], pair[1]
                    )));
                }
            }
            stack.extend_from_slice(&group.children);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn term(output: &str, rank: &[u32]) -> Arc<Term> {
        Arc::new(Term::new(output.to_uppercase(), output, Rank::new(rank.to_vec())))
    }

    fn outputs(tree: &SelectionTree) -> Vec<String> {
        tree.terms().iter().map(|t| t.output_text.clone()).collect()
    }

    #[test]
    fn test_select_keeps_rank_order() {
        let mut tree = SelectionTree::new();
        let c = term("c", &[1, 0]);
        let a = term("a", &[0, 0]);
        let b = term("b", &[0, 1]);

        tree.select(c);
        tree.select(a);
        tree.select(b);

        assert_eq!(outputs(&tree), vec!["a", "b", "c"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_select_skips_duplicates() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0, 0]);
        assert!(tree.select(Arc::clone(&a)).is_some());
        assert!(tree.select(a).is_none());
        assert_eq!(tree.children(tree.root()).len(), 1);
    }

    #[test]
    fn test_same_output_different_rank_are_distinct() {
        let mut tree = SelectionTree::new();
        tree.select(term("knife", &[3, 1]));
        tree.select(term("knife", &[5, 0]));
        assert_eq!(tree.terms().len(), 2);
    }

    #[test]
    fn test_find_group_returns_direct_owner() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0, 0]);
        let single = tree.select(Arc::clone(&a)).unwrap();

        assert_eq!(tree.find_group(tree.root(), &a), Some(single));
        assert_eq!(tree.find_group(tree.root(), &term("z", &[9])), None);
    }

    #[test]
    fn test_remove_absent_child_is_noop() {
        let mut tree = SelectionTree::new();
        let single = tree.select(term("a", &[0])).unwrap();
        let before = tree.node_count();

        assert!(!tree.remove(tree.root(), NodeId::new(999)));
        assert!(!tree.remove(NodeId::new(999), single));
        assert_eq!(tree.node_count(), before);
    }

    #[test]
    fn test_remove_prunes_recursively() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let outer = tree.new_group();
        let inner = tree.new_group();
        let leaf = tree.new_leaf(Arc::clone(&a));
        tree.insert(inner, &[leaf]).unwrap();
        tree.insert(outer, &[inner]).unwrap();
        tree.insert(tree.root(), &[outer]).unwrap();

        assert!(tree.remove(inner, leaf));

        assert!(tree.is_empty());
        assert!(tree.get(inner).is_none());
        assert!(tree.get(outer).is_none());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_root_never_pruned() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        tree.select(Arc::clone(&a));
        assert!(tree.deselect(&a));
        assert!(tree.get(tree.root()).is_some());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_moves_group_between_parents() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        let ga = tree.select(Arc::clone(&a)).unwrap();
        let gb = tree.select(Arc::clone(&b)).unwrap();

        // Move a's singleton into b's: b's group now has two children, and the
        // root no longer lists ga.
        tree.insert(gb, &[ga]).unwrap();

        assert_eq!(tree.parent(ga), Some(gb));
        assert_eq!(tree.children(tree.root()), &[gb]);
        assert_eq!(tree.children(gb)[0], ga);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut tree = SelectionTree::new();
        let outer = tree.select(term("a", &[0])).unwrap();
        let inner = tree.new_group();
        let leaf = tree.new_leaf(term("b", &[1]));
        tree.insert(inner, &[leaf]).unwrap();
        tree.insert(outer, &[inner]).unwrap();

        let err = tree.insert(inner, &[outer]).unwrap_err();
        assert_eq!(err, TreeError::WouldCycle { node: outer, into: inner });
        assert!(matches!(tree.insert(outer, &[outer]), Err(TreeError::WouldCycle { .. })));
        assert!(matches!(tree.insert(inner, &[tree.root()]), Err(TreeError::WouldCycle { .. })));
    }

    #[test]
    fn test_insert_rejects_empty_groups() {
        let mut tree = SelectionTree::new();
        let empty = tree.new_group();

        assert_eq!(tree.insert(tree.root(), &[empty]), Err(TreeError::EmptyGroup(empty)));
        assert!(tree.is_empty());
        tree.check_invariants().unwrap();

        // A group holding only empty groups is just as empty.
        let outer = tree.new_group();
        assert_eq!(tree.insert(outer, &[empty]), Err(TreeError::EmptyGroup(empty)));
        let wrapper = tree.new_group();
        let hollow = tree.new_group();
        tree.attach(wrapper, hollow);
        assert_eq!(tree.insert(tree.root(), &[wrapper]), Err(TreeError::EmptyGroup(wrapper)));
        assert_eq!(tree.children(tree.root()), &[] as &[NodeId]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_into_leaf_fails() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        tree.select(Arc::clone(&a));
        let leaf = tree.find_leaf(tree.root(), &a).unwrap();
        let group = tree.new_group();

        assert_eq!(tree.insert(leaf, &[group]), Err(TreeError::NotAGroup(leaf)));
        assert_eq!(
            tree.insert(NodeId::new(404), &[group]),
            Err(TreeError::NodeNotFound(NodeId::new(404)))
        );
    }

    #[test]
    fn test_lca_siblings_in_same_group() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0, 0]);
        let b = term("b", &[0, 1]);
        let g = tree.new_group();
        let la = tree.new_leaf(Arc::clone(&a));
        let lb = tree.new_leaf(Arc::clone(&b));
        tree.insert(g, &[la, lb]).unwrap();
        tree.insert(tree.root(), &[g]).unwrap();

        assert_eq!(tree.lowest_common_ancestor(tree.root(), &[a, b]), Some(g));
    }

    #[test]
    fn test_lca_unrelated_groups_is_root() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0, 0]);
        let b = term("b", &[0, 1]);
        tree.select(Arc::clone(&a));
        tree.select(Arc::clone(&b));

        assert_eq!(tree.lowest_common_ancestor(tree.root(), &[a, b]), Some(tree.root()));
    }

    #[test]
    fn test_lca_uneven_depths() {
        // root → outer → [inner → [a, b], single → [c]]
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        let c = term("c", &[2]);
        let outer = tree.new_group();
        let inner = tree.new_group();
        let single = tree.new_group();
        let la = tree.new_leaf(Arc::clone(&a));
        let lb = tree.new_leaf(Arc::clone(&b));
        let lc = tree.new_leaf(Arc::clone(&c));
        tree.insert(inner, &[la, lb]).unwrap();
        tree.insert(single, &[lc]).unwrap();
        tree.insert(outer, &[inner, single]).unwrap();
        tree.insert(tree.root(), &[outer]).unwrap();

        let root = tree.root();
        assert_eq!(tree.lowest_common_ancestor(root, &[Arc::clone(&a), Arc::clone(&c)]), Some(outer));
        assert_eq!(tree.lowest_common_ancestor(root, &[Arc::clone(&a), Arc::clone(&b)]), Some(inner));
        // Searching from a sub-root keeps the answer inside it.
        assert_eq!(tree.lowest_common_ancestor(outer, &[a, c]), Some(outer));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_lca_missing_term_is_none() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        tree.select(Arc::clone(&a));
        assert_eq!(tree.lowest_common_ancestor(tree.root(), &[a, term("z", &[9])]), None);
        assert_eq!(tree.lowest_common_ancestor(tree.root(), &[]), None);
    }

    #[test]
    fn test_group_moves_only_the_picked_member() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let x = term("x", &[1]);
        let b = term("b", &[2]);
        for t in [&a, &x, &b] {
            tree.select(Arc::clone(t));
        }
        let ax = tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&x)]).unwrap().unwrap();

        let ab = tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&b)]).unwrap().unwrap();

        // The old (a, x) composite lost a and collapsed to x's singleton.
        assert!(tree.get(ax).is_none());
        assert_eq!(tree.children(tree.root()).len(), 2);
        assert_eq!(tree.children(tree.root())[0], ab);
        assert_eq!(outputs(&tree), vec!["a", "b", "x"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_group_needs_two_present_terms() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        tree.select(Arc::clone(&a));
        let before = tree.node_count();

        assert_eq!(tree.group(tree.root(), &[Arc::clone(&a)]).unwrap(), None);
        assert_eq!(tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&a)]).unwrap(), None);
        assert_eq!(tree.group(tree.root(), &[a, term("z", &[9])]).unwrap(), None);
        assert_eq!(tree.node_count(), before);
    }

    #[test]
    fn test_group_within_group_collapses_wrapper() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        tree.select(Arc::clone(&a));
        tree.select(Arc::clone(&b));
        let first = tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&b)]).unwrap().unwrap();

        // Regrouping the same two terms attaches a new composite inside the
        // old one; the old one empties of its own members and collapses.
        let second = tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&b)]).unwrap().unwrap();

        assert!(tree.get(first).is_none());
        assert_eq!(tree.children(tree.root()), &[second]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_ungroup_moves_to_root() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        let c = term("c", &[2]);
        for t in [&a, &b, &c] {
            tree.select(Arc::clone(t));
        }
        let abc = tree
            .group(tree.root(), &[Arc::clone(&a), Arc::clone(&b), Arc::clone(&c)])
            .unwrap()
            .unwrap();

        let singles = tree.ungroup(tree.root(), &[Arc::clone(&b)]).unwrap();

        assert_eq!(singles.len(), 1);
        assert_eq!(tree.parent(singles[0]), Some(tree.root()));
        assert_eq!(tree.children(abc).len(), 2);
        assert_eq!(tree.children(tree.root()), &[abc, singles[0]]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_ungroup_all_members_prunes_composite() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        tree.select(Arc::clone(&a));
        tree.select(Arc::clone(&b));
        let ab = tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&b)]).unwrap().unwrap();

        tree.ungroup(tree.root(), &[a, b]).unwrap();

        assert!(tree.get(ab).is_none());
        assert_eq!(tree.children(tree.root()).len(), 2);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_parent_rank_change_resorts_ancestors() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        let x = term("x", &[2]);
        for t in [&a, &b, &x] {
            tree.select(Arc::clone(t));
        }
        let ax = tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&x)]).unwrap().unwrap();
        assert_eq!(tree.children(tree.root())[0], ax);

        // Removing a makes the composite rank as x, which now sorts after b.
        tree.deselect(&a);

        assert_eq!(outputs(&tree), vec!["b", "x"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_set_weight_validation() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let single = tree.select(Arc::clone(&a)).unwrap();
        let leaf = tree.find_leaf(tree.root(), &a).unwrap();

        tree.set_weight(single, Some(1.5)).unwrap();
        assert_eq!(tree.weight(single), Some(1.5));
        assert_eq!(tree.set_weight(single, Some(f64::NAN)).unwrap_err().to_string(), "invalid weight NaN: must be finite");
        assert_eq!(tree.set_weight(leaf, Some(1.0)), Err(TreeError::NotAGroup(leaf)));

        tree.set_weight(single, None).unwrap();
        assert_eq!(tree.weight(single), None);
    }

    #[test]
    fn test_clearing_weight_collapses_wrapper() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        tree.select(Arc::clone(&a));
        tree.select(Arc::clone(&b));
        let ab = tree.group(tree.root(), &[Arc::clone(&a), Arc::clone(&b)]).unwrap().unwrap();

        let outer = tree.new_group();
        tree.insert(outer, &[ab]).unwrap();
        tree.insert(tree.root(), &[outer]).unwrap();
        tree.set_weight(outer, Some(1.1)).unwrap();
        assert_eq!(tree.parent(ab), Some(outer));

        tree.set_weight(outer, None).unwrap();

        assert!(tree.get(outer).is_none());
        assert_eq!(tree.parent(ab), Some(tree.root()));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_clear_resets() {
        let mut tree = SelectionTree::new();
        tree.select(term("a", &[0]));
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_check_invariants_detects_unsorted() {
        let mut tree = SelectionTree::new();
        tree.select(term("a", &[0]));
        tree.select(term("b", &[1]));
        if let Some(root) = tree.nodes.get_mut(&NodeId::ROOT).and_then(Node::as_group_mut) {
            root.children.reverse();
        }
        assert!(matches!(tree.check_invariants(), Err(TreeError::Invariant(_))));
    }
}
