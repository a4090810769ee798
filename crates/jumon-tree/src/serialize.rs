//! Tree → prompt text.
//!
//! ```text
//! prompt := item (", " item)*
//! item   := output_text | group
//! group  := "(" item (", " item)* (":" weight)? ")"
//! ```

use std::fmt;

use jumon_types::{MAX_TREE_DEPTH, NodeId};

use crate::node::NodeKind;
use crate::tree::SelectionTree;

/// Separator between sibling items.
pub const ITEM_SEPARATOR: &str = ", ";

impl SelectionTree {
    /// The composed prompt for the whole selection.
    pub fn to_prompt(&self) -> String {
        self.serialize(self.root())
    }

    /// Render the subtree at `id`. Unknown ids render as the empty string.
    ///
    /// A group is parenthesized when it carries a weight, or when it is not
    /// the root and either has several children or wraps a single group.
    pub fn serialize(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, 0, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, depth: usize, out: &mut String) {
        if depth > MAX_TREE_DEPTH {
            tracing::warn!("serialize() hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}), truncating");
            return;
        }
        let Some(node) = self.get(id) else { return };

        let group = match &node.kind {
            NodeKind::Leaf(term) => {
                out.push_str(&term.output_text);
                return;
            }
            NodeKind::Group(group) => group,
        };

        let wraps_group = group.children.len() == 1 && self.is_group(group.children[0]);
        let parenthesize = group.weight.is_some() || (!id.is_root() && (group.children.len() > 1 || wraps_group));

        if parenthesize {
            out.push('(');
        }
        for (i, &child) in group.children.iter().enumerate() {
            if i > 0 {
                out.push_str(ITEM_SEPARATOR);
            }
            self.write_node(child, depth + 1, out);
        }
        if let Some(weight) = group.weight {
            out.push(':');
            out.push_str(&weight.to_string());
        }
        if parenthesize {
            out.push(')');
        }
    }
}

impl fmt::Display for SelectionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prompt())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jumon_types::{Rank, Term};

    use super::*;

    fn term(output: &str, rank: &[u32]) -> Arc<Term> {
        Arc::new(Term::new(output, output, Rank::new(rank.to_vec())))
    }

    #[test]
    fn test_empty_tree_is_empty_string() {
        assert_eq!(SelectionTree::new().to_prompt(), "");
    }

    #[test]
    fn test_singletons_render_bare() {
        let mut tree = SelectionTree::new();
        tree.select(term("b", &[1]));
        tree.select(term("a", &[0]));
        assert_eq!(tree.to_prompt(), "a, b");
        assert_eq!(tree.to_string(), "a, b");
    }

    #[test]
    fn test_weighted_singleton_is_parenthesized() {
        let mut tree = SelectionTree::new();
        let single = tree.select(term("a", &[0])).unwrap();
        tree.set_weight(single, Some(0.8)).unwrap();
        assert_eq!(tree.to_prompt(), "(a:0.8)");
    }

    #[test]
    fn test_integral_weight_renders_without_fraction() {
        let mut tree = SelectionTree::new();
        let single = tree.select(term("a", &[0])).unwrap();
        tree.set_weight(single, Some(2.0)).unwrap();
        assert_eq!(tree.to_prompt(), "(a:2)");
    }

    #[test]
    fn test_group_wrapping_group_keeps_parens() {
        let mut tree = SelectionTree::new();
        let a = term("a", &[0]);
        let b = term("b", &[1]);
        tree.select(Arc::clone(&a));
        tree.select(Arc::clone(&b));
        let ab = tree.group(tree.root(), &[a, b]).unwrap().unwrap();

        let outer = tree.new_group();
        tree.insert(outer, &[ab]).unwrap();
        tree.insert(tree.root(), &[outer]).unwrap();

        assert_eq!(tree.to_prompt(), "((a, b))");
        assert_eq!(tree.serialize(ab), "(a, b)");
    }

    #[test]
    fn test_root_weight_is_parenthesized() {
        let mut tree = SelectionTree::new();
        tree.select(term("a", &[0]));
        tree.select(term("b", &[1]));
        tree.set_weight(tree.root(), Some(1.1)).unwrap();
        assert_eq!(tree.to_prompt(), "(a, b:1.1)");
    }

    #[test]
    fn test_unknown_id_renders_empty() {
        let tree = SelectionTree::new();
        assert_eq!(tree.serialize(NodeId::new(77)), "");
    }
}
