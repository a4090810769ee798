//! Selection tree visualization: ASCII lines and a serializable snapshot.

use jumon_types::{MAX_TREE_DEPTH, NodeId, Rank};
use serde::Serialize;

use crate::node::NodeKind;
use crate::tree::SelectionTree;

/// Format the selection as ASCII tree lines.
///
/// ```text
/// root
/// ├─ #3
/// │  └─ 傑作 → masterpiece [0-0-1]
/// └─ #7 :1.2
///    ├─ ...
/// ```
pub fn format_tree(tree: &SelectionTree) -> Vec<String> {
    let mut lines = Vec::new();
    format_node(tree, tree.root(), 0, "", true, &mut lines);
    lines
}

fn format_node(tree: &SelectionTree, id: NodeId, depth: usize, prefix: &str, is_last: bool, lines: &mut Vec<String>) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    let Some(node) = tree.get(id) else { return };

    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└─ "
    } else {
        "├─ "
    };

    let label = match &node.kind {
        NodeKind::Leaf(term) => format!("{} → {} [{}]", term.display_text, term.output_text, term.rank),
        NodeKind::Group(group) => {
            let name = if id.is_root() { "root".to_string() } else { id.to_string() };
            match group.weight {
                Some(weight) => format!("{name} :{weight}"),
                None => name,
            }
        }
    };
    lines.push(format!("{prefix}{connector}{label}"));

    let child_prefix = if depth == 0 {
        String::new()
    } else if is_last {
        format!("{prefix}   ")
    } else {
        format!("{prefix}│  ")
    };

    let children = node.children();
    for (i, &child) in children.iter().enumerate() {
        format_node(tree, child, depth + 1, &child_prefix, i == children.len() - 1, lines);
    }
}

/// Owned, serializable copy of a subtree (for `--json` style output).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    Group {
        id: NodeId,
        #[serde(skip_serializing_if = "Option::is_none")]
        weight: Option<f64>,
        children: Vec<Snapshot>,
    },
    Leaf {
        id: NodeId,
        display: String,
        output: String,
        rank: Rank,
    },
}

impl SelectionTree {
    /// Snapshot the whole tree.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_node(self.root(), 0).unwrap_or(Snapshot::Group {
            id: self.root(),
            weight: None,
            children: Vec::new(),
        })
    }

    fn snapshot_node(&self, id: NodeId, depth: usize) -> Option<Snapshot> {
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        let node = self.get(id)?;
        Some(match &node.kind {
            NodeKind::Leaf(term) => Snapshot::Leaf {
                id,
                display: term.display_text.clone(),
                output: term.output_text.clone(),
                rank: term.rank.clone(),
            },
            NodeKind::Group(group) => Snapshot::Group {
                id,
                weight: group.weight,
                children: group
                    .children
                    .iter()
                    .filter_map(|&child| self.snapshot_node(child, depth + 1))
                    .collect(),
            },
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
